//! Scenario Model
//!
//! Language-independent description of a load-test script: which user
//! classes exist, how long they wait between tasks, which tasks they run and
//! how often, and which HTTP endpoints those tasks hit.

use crate::domain::ast::Location;
use crate::domain::diagnostic::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything recovered from one script.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioModel {
    /// User classes in declaration order.
    pub user_classes: Vec<UserClassModel>,
}

impl ScenarioModel {
    pub fn is_empty(&self) -> bool {
        self.user_classes.is_empty()
    }

    pub fn find_class(&self, name: &str) -> Option<&UserClassModel> {
        self.user_classes.iter().find(|c| c.name == name)
    }

    /// Total number of call sites across every class and task.
    pub fn call_count(&self) -> usize {
        self.user_classes
            .iter()
            .flat_map(|c| c.tasks.iter())
            .map(|t| t.calls.len())
            .sum()
    }
}

/// One simulated client behavior profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserClassModel {
    pub name: String,
    /// Immediate parent as written in the class header (`HttpUser`, `locust.HttpUser`, `BaseUser`).
    pub base_name: String,
    pub wait_time: Option<WaitTimeSpec>,
    /// Tasks in declaration order.
    pub tasks: Vec<TaskModel>,
    /// Class-level `weight` attribute; 1 when not declared.
    pub weight: u32,
    pub host: Option<String>,
    pub is_abstract: bool,
    pub location: Location,
}

impl UserClassModel {
    pub fn find_task(&self, name: &str) -> Option<&TaskModel> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn total_task_weight(&self) -> u64 {
        self.tasks.iter().map(|t| u64::from(t.weight)).sum()
    }
}

/// Distribution of pauses between task executions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaitTimeSpec {
    Constant { value: f64 },
    Range { low: f64, high: f64 },
    Unresolved { raw_expression: String },
}

impl WaitTimeSpec {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, WaitTimeSpec::Unresolved { .. })
    }
}

impl fmt::Display for WaitTimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitTimeSpec::Constant { value } => write!(f, "constant({})", value),
            WaitTimeSpec::Range { low, high } => write!(f, "between({}, {})", low, high),
            WaitTimeSpec::Unresolved { raw_expression } => write!(f, "unresolved `{}`", raw_expression),
        }
    }
}

/// One weighted task function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskModel {
    pub name: String,
    /// Always >= 1.
    pub weight: u32,
    /// Potential call sites in lexical order.
    pub calls: Vec<CallSite>,
    pub location: Location,
}

/// One statically recognized HTTP-style call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSite {
    pub method: HttpMethod,
    pub path: PathValue,
    /// Request-name override passed as `name="..."`.
    pub name: Option<String>,
    pub location: Location,
}

impl CallSite {
    /// Short label such as `GET /items`.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PathValue {
    Resolved(String),
    Unresolved(String),
}

impl PathValue {
    pub fn as_resolved(&self) -> Option<&str> {
        match self {
            PathValue::Resolved(path) => Some(path),
            PathValue::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValue::Resolved(path) => write!(f, "{}", path),
            PathValue::Unresolved(raw) => write!(f, "<{}>", raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Case-insensitive parse (`"get"`, `"GET"`).
    pub fn from_name(s: &str) -> Option<HttpMethod> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one successful extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub model: ScenarioModel,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}

/// Outcome of processing one script file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub model: ScenarioModel,
    pub diagnostics: Vec<Diagnostic>,
    /// Adapter failure message; the model is empty when set.
    pub failure: Option<String>,
}

impl FileReport {
    pub fn from_extraction(path: impl Into<String>, extraction: Extraction) -> Self {
        Self {
            path: path.into(),
            model: extraction.model,
            diagnostics: extraction.diagnostics,
            failure: None,
        }
    }

    pub fn failed(path: impl Into<String>, failure: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            model: ScenarioModel::default(),
            diagnostics: Vec::new(),
            failure: Some(failure.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| !d.is_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_from_name() {
        assert_eq!(HttpMethod::from_name("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::from_name("DELETE"), Some(HttpMethod::Delete));
        assert_eq!(HttpMethod::from_name("Options"), Some(HttpMethod::Options));
        assert_eq!(HttpMethod::from_name("fetch"), None);
    }

    #[test]
    fn test_call_site_label() {
        let call = CallSite {
            method: HttpMethod::Post,
            path: PathValue::Resolved("/login".to_string()),
            name: None,
            location: Location::new(3, 9),
        };
        assert_eq!(call.label(), "POST /login");

        let unresolved = CallSite {
            path: PathValue::Unresolved("url".to_string()),
            ..call
        };
        assert_eq!(unresolved.label(), "POST <url>");
    }

    #[test]
    fn test_wait_time_serializes_with_kind_tag() {
        let json = serde_json::to_value(WaitTimeSpec::Range { low: 1.0, high: 5.0 }).unwrap();
        assert_eq!(json["kind"], "range");
        assert_eq!(json["low"], 1.0);
        assert_eq!(json["high"], 5.0);
    }
}
