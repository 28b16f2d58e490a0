//! Task Collector
//!
//! Detects task functions in a user-class body and the HTTP call sites inside
//! them.
//!
//! Recognized marker shapes (names come from the dialect):
//! - `@task`                 weight 1
//! - `@task()`               weight 1
//! - `@task(3)`              explicit weight
//! - `@task(weight=3)`       explicit weight
//!
//! Call sites are `<client>.<verb>(path, ...)` and `<client>.request(verb, path, ...)`.
//! The body is searched through every control-flow block and sub-expression,
//! but never inside nested functions, classes or lambdas.

use crate::domain::ast::{Expr, ExprKind, FunctionDef, Keyword, Stmt, StmtKind};
use crate::domain::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::domain::dialect::DialectConfig;
use crate::domain::literal::{self, Literal};
use crate::domain::model::{CallSite, HttpMethod, PathValue, TaskModel};

pub struct TaskCollector<'a> {
    dialect: &'a DialectConfig,
}

impl<'a> TaskCollector<'a> {
    pub fn new(dialect: &'a DialectConfig) -> Self {
        Self { dialect }
    }

    /// Tasks declared directly in `body`, in declaration order.
    pub fn collect(
        &self,
        class_name: &str,
        body: &[Stmt],
        diagnostics: &mut Diagnostics,
    ) -> Vec<TaskModel> {
        let mut tasks = Vec::new();

        for stmt in body {
            let StmtKind::FunctionDef(def) = &stmt.kind else {
                continue;
            };
            let markers = self.task_markers(def);
            let Some(first) = markers.first() else {
                continue;
            };

            let entity = format!("{}.{}", class_name, def.name);
            if markers.len() > 1 {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::AmbiguousWeight,
                        format!(
                            "function has {} task markers; using the first one (`@{}`)",
                            markers.len(),
                            first.text
                        ),
                        markers[1].location,
                    )
                    .with_entity(entity.clone()),
                );
            }

            let weight = self.marker_weight(first, &entity, diagnostics);

            let mut calls = Vec::new();
            self.collect_block(&def.body, &entity, &mut calls, diagnostics);

            tasks.push(TaskModel {
                name: def.name.clone(),
                weight,
                calls,
                location: stmt.location,
            });
        }

        tasks
    }

    /// Decorators of `def` that are task markers, in source order.
    fn task_markers<'ast>(&self, def: &'ast FunctionDef) -> Vec<&'ast Expr> {
        def.decorators
            .iter()
            .filter(|d| match &d.kind {
                ExprKind::Call { func, .. } => self.dialect.is_task_marker(func),
                _ => self.dialect.is_task_marker(d),
            })
            .collect()
    }

    fn marker_weight(&self, marker: &Expr, entity: &str, diagnostics: &mut Diagnostics) -> u32 {
        let ExprKind::Call { args, keywords, .. } = &marker.kind else {
            return 1;
        };

        match (args.as_slice(), keywords.as_slice()) {
            ([], []) => 1,
            ([weight], []) => resolve_weight(weight, entity, diagnostics),
            ([], [kw]) if kw.name == "weight" => resolve_weight(&kw.value, entity, diagnostics),
            _ => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::InvalidWeight,
                        format!(
                            "task marker `{}` must take a single weight argument; using weight 1",
                            marker.text
                        ),
                        marker.location,
                    )
                    .with_entity(entity),
                );
                1
            }
        }
    }

    fn collect_block(
        &self,
        stmts: &[Stmt],
        entity: &str,
        out: &mut Vec<CallSite>,
        diagnostics: &mut Diagnostics,
    ) {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::ClassDef(_) | StmtKind::FunctionDef(_) => {}
                StmtKind::Assign { targets, value } => {
                    for target in targets {
                        self.collect_expr(target, entity, out, diagnostics);
                    }
                    if let Some(value) = value {
                        self.collect_expr(value, entity, out, diagnostics);
                    }
                }
                StmtKind::Expr(expr) => self.collect_expr(expr, entity, out, diagnostics),
                StmtKind::Return(value) => {
                    if let Some(value) = value {
                        self.collect_expr(value, entity, out, diagnostics);
                    }
                }
                StmtKind::If { test, body, orelse } => {
                    self.collect_expr(test, entity, out, diagnostics);
                    self.collect_block(body, entity, out, diagnostics);
                    self.collect_block(orelse, entity, out, diagnostics);
                }
                StmtKind::Loop { header, body, orelse } => {
                    for expr in header {
                        self.collect_expr(expr, entity, out, diagnostics);
                    }
                    self.collect_block(body, entity, out, diagnostics);
                    self.collect_block(orelse, entity, out, diagnostics);
                }
                StmtKind::Try {
                    body,
                    handlers,
                    orelse,
                    finalbody,
                } => {
                    self.collect_block(body, entity, out, diagnostics);
                    for handler in handlers {
                        self.collect_block(handler, entity, out, diagnostics);
                    }
                    self.collect_block(orelse, entity, out, diagnostics);
                    self.collect_block(finalbody, entity, out, diagnostics);
                }
                StmtKind::With { items, body } => {
                    for item in items {
                        self.collect_expr(item, entity, out, diagnostics);
                    }
                    self.collect_block(body, entity, out, diagnostics);
                }
                StmtKind::Other { exprs, blocks } => {
                    for expr in exprs {
                        self.collect_expr(expr, entity, out, diagnostics);
                    }
                    for block in blocks {
                        self.collect_block(block, entity, out, diagnostics);
                    }
                }
            }
        }
    }

    /// Pre-order walk: an outer call is examined before the calls nested in it.
    fn collect_expr(
        &self,
        expr: &Expr,
        entity: &str,
        out: &mut Vec<CallSite>,
        diagnostics: &mut Diagnostics,
    ) {
        if let ExprKind::Opaque = expr.kind {
            return;
        }
        if let ExprKind::Call { func, args, keywords } = &expr.kind {
            if let Some(site) = self.match_call(expr, func, args, keywords, entity, diagnostics) {
                out.push(site);
            }
        }
        for child in expr.children() {
            self.collect_expr(child, entity, out, diagnostics);
        }
    }

    fn match_call(
        &self,
        call: &Expr,
        func: &Expr,
        args: &[Expr],
        keywords: &[Keyword],
        entity: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<CallSite> {
        let ExprKind::Attribute { value: receiver, attr: method_name } = &func.kind else {
            return None;
        };
        if !self.dialect.is_client_accessor(receiver) {
            return None;
        }

        let (method, path_arg) = if let Some(method) = self.dialect.verb(method_name) {
            let path_arg = args.first().or_else(|| Keyword::find(keywords, "url").map(|k| &k.value));
            (method, path_arg)
        } else if self.dialect.is_request_method(method_name) {
            let verb_arg = args.first().or_else(|| Keyword::find(keywords, "method").map(|k| &k.value));
            let method = self.request_verb(call, verb_arg, entity, diagnostics)?;
            let path_arg = args.get(1).or_else(|| Keyword::find(keywords, "url").map(|k| &k.value));
            (method, path_arg)
        } else {
            return None;
        };

        let path = match path_arg {
            Some(arg) => match literal::evaluate_str(arg) {
                Some(path) => PathValue::Resolved(path),
                None => {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::UnresolvedExpression,
                            format!("{} path `{}` is not a string literal", method, arg.text),
                            arg.location,
                        )
                        .with_entity(entity),
                    );
                    PathValue::Unresolved(arg.text.clone())
                }
            },
            None => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::UnresolvedExpression,
                        format!("{} call `{}` has no path argument", method, call.text),
                        call.location,
                    )
                    .with_entity(entity),
                );
                PathValue::Unresolved(String::new())
            }
        };

        let name = Keyword::find(keywords, "name").and_then(|k| literal::evaluate_str(&k.value));

        Some(CallSite {
            method,
            path,
            name,
            location: call.location,
        })
    }

    /// Verb of a generic `client.request(verb, ...)` call.
    fn request_verb(
        &self,
        call: &Expr,
        verb_arg: Option<&Expr>,
        entity: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<HttpMethod> {
        let Some(verb_arg) = verb_arg else {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::UnknownHttpMethod,
                    format!("request call `{}` does not name an HTTP method", call.text),
                    call.location,
                )
                .with_entity(entity),
            );
            return None;
        };

        match literal::evaluate_str(verb_arg) {
            Some(verb) => match HttpMethod::from_name(&verb).filter(|m| self.dialect.allows_method(*m)) {
                Some(method) => Some(method),
                None => {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::UnknownHttpMethod,
                            format!("`{}` is not a recognized HTTP method", verb),
                            verb_arg.location,
                        )
                        .with_entity(entity),
                    );
                    None
                }
            },
            None => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::UnresolvedExpression,
                        format!("HTTP method `{}` is not a string literal", verb_arg.text),
                        verb_arg.location,
                    )
                    .with_entity(entity),
                );
                None
            }
        }
    }
}

/// Weight from a literal expression. Anything other than a positive integer
/// literal is reported and replaced by 1.
pub(crate) fn resolve_weight(expr: &Expr, entity: &str, diagnostics: &mut Diagnostics) -> u32 {
    let problem = match literal::evaluate(expr) {
        Some(Literal::Int(value)) if value >= 1 => {
            return u32::try_from(value).unwrap_or(u32::MAX);
        }
        Some(Literal::Int(value)) => (
            DiagnosticCode::InvalidWeight,
            format!("weight {} must be at least 1; using 1", value),
        ),
        Some(Literal::Float(_)) => (
            DiagnosticCode::InvalidWeight,
            format!("weight `{}` must be an integer; using 1", expr.text),
        ),
        Some(_) => (
            DiagnosticCode::InvalidWeight,
            format!("weight `{}` is not a number; using 1", expr.text),
        ),
        None => (
            DiagnosticCode::UnresolvedExpression,
            format!("weight `{}` cannot be resolved to a constant; using 1", expr.text),
        ),
    };

    let (code, message) = problem;
    diagnostics.push(Diagnostic::new(code, message, expr.location).with_entity(entity));
    1
}
