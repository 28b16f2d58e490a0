//! Dialect Configuration
//!
//! Names the extractor recognizes. Defaults follow Locust's conventions;
//! every field can be overridden to support dialect variants.

use crate::domain::ast::Expr;
use crate::domain::model::HttpMethod;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DialectConfig {
    /// Root user types (aliases of the canonical HTTP user base).
    pub root_bases: Vec<String>,
    pub wait_time_attribute: String,
    /// Two-argument constant-range constructors, e.g. `between`.
    pub range_functions: Vec<String>,
    /// One-argument constant constructors, e.g. `constant`.
    pub constant_functions: Vec<String>,
    pub task_markers: Vec<String>,
    pub client_accessors: Vec<String>,
    /// Client method name -> HTTP verb.
    pub verbs: BTreeMap<String, HttpMethod>,
    /// Client methods taking the verb as their first argument, e.g. `request`.
    pub request_methods: Vec<String>,
    pub weight_attribute: String,
    pub host_attribute: String,
    pub abstract_attribute: String,
}

impl Default for DialectConfig {
    fn default() -> Self {
        let verbs = HttpMethod::ALL
            .into_iter()
            .map(|m| (m.as_str().to_ascii_lowercase(), m))
            .collect();

        Self {
            root_bases: vec!["HttpUser".to_string(), "FastHttpUser".to_string()],
            wait_time_attribute: "wait_time".to_string(),
            range_functions: vec!["between".to_string()],
            constant_functions: vec!["constant".to_string()],
            task_markers: vec!["task".to_string()],
            client_accessors: vec!["client".to_string()],
            verbs,
            request_methods: vec!["request".to_string()],
            weight_attribute: "weight".to_string(),
            host_attribute: "host".to_string(),
            abstract_attribute: "abstract".to_string(),
        }
    }
}

impl DialectConfig {
    /// Does this base-class expression name a root user type?
    pub fn is_root_base(&self, base: &Expr) -> bool {
        matches_name(&self.root_bases, base)
    }

    pub fn is_task_marker(&self, expr: &Expr) -> bool {
        matches_name(&self.task_markers, expr)
    }

    pub fn is_range_function(&self, expr: &Expr) -> bool {
        matches_name(&self.range_functions, expr)
    }

    pub fn is_constant_function(&self, expr: &Expr) -> bool {
        matches_name(&self.constant_functions, expr)
    }

    /// Receiver of a call such as `self.client` or `client`.
    pub fn is_client_accessor(&self, receiver: &Expr) -> bool {
        receiver
            .last_segment()
            .is_some_and(|seg| self.client_accessors.iter().any(|a| a == seg))
    }

    pub fn verb(&self, method_name: &str) -> Option<HttpMethod> {
        self.verbs.get(method_name).copied()
    }

    /// Is `method` one of the verbs this dialect enables?
    pub fn allows_method(&self, method: HttpMethod) -> bool {
        self.verbs.values().any(|m| *m == method)
    }

    pub fn is_request_method(&self, method_name: &str) -> bool {
        self.request_methods.iter().any(|m| m == method_name)
    }
}

/// A `Name`/`Attribute` chain matches when its full dotted text or its final
/// segment is one of `names` (`task`, `locust.task`).
fn matches_name(names: &[String], expr: &Expr) -> bool {
    let Some(dotted) = expr.dotted_name() else {
        return false;
    };
    let last = dotted.rsplit('.').next().unwrap_or(&dotted);
    names.iter().any(|n| *n == dotted || n == last)
}
