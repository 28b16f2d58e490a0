//! Attribute Resolver
//!
//! Reads class-level attribute assignments of a user class: the wait-time
//! policy plus `weight`, `host` and `abstract`. Like Python assignment, the
//! last textual binding of a name wins.

use crate::domain::ast::{Expr, ExprKind, Location, Stmt, StmtKind};
use crate::domain::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::domain::dialect::DialectConfig;
use crate::domain::literal::{self, Literal};
use crate::domain::model::WaitTimeSpec;
use crate::domain::tasks::resolve_weight;

/// Attributes resolved from one class body.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassAttributes {
    pub wait_time: Option<WaitTimeSpec>,
    pub weight: u32,
    pub host: Option<String>,
    pub is_abstract: bool,
}

impl Default for ClassAttributes {
    fn default() -> Self {
        Self {
            wait_time: None,
            weight: 1,
            host: None,
            is_abstract: false,
        }
    }
}

/// The statement that last bound an attribute name.
#[derive(Debug, Clone, Copy)]
enum Binding<'ast> {
    Value(&'ast Expr),
    /// `def wait_time(self): ...`
    Method { name: &'ast str, location: Location },
}

pub struct AttributeResolver<'a> {
    dialect: &'a DialectConfig,
}

impl<'a> AttributeResolver<'a> {
    pub fn new(dialect: &'a DialectConfig) -> Self {
        Self { dialect }
    }

    pub fn resolve(
        &self,
        class_name: &str,
        body: &[Stmt],
        diagnostics: &mut Diagnostics,
    ) -> ClassAttributes {
        let mut attrs = ClassAttributes::default();

        if let Some(binding) = last_binding(body, &self.dialect.wait_time_attribute) {
            attrs.wait_time = Some(self.resolve_wait_time(class_name, binding, diagnostics));
        }

        if let Some(Binding::Value(expr)) = last_binding(body, &self.dialect.weight_attribute) {
            attrs.weight = resolve_weight(expr, class_name, diagnostics);
        }

        if let Some(Binding::Value(expr)) = last_binding(body, &self.dialect.host_attribute) {
            match literal::evaluate(expr) {
                Some(Literal::Str(host)) => attrs.host = Some(host),
                // `host = None` is Locust's own default
                Some(Literal::None) => {}
                _ => diagnostics.push(unresolved(
                    class_name,
                    &self.dialect.host_attribute,
                    expr,
                )),
            }
        }

        if let Some(Binding::Value(expr)) = last_binding(body, &self.dialect.abstract_attribute) {
            match literal::evaluate(expr) {
                Some(Literal::Bool(flag)) => attrs.is_abstract = flag,
                _ => diagnostics.push(unresolved(
                    class_name,
                    &self.dialect.abstract_attribute,
                    expr,
                )),
            }
        }

        attrs
    }

    fn resolve_wait_time(
        &self,
        class_name: &str,
        binding: Binding<'_>,
        diagnostics: &mut Diagnostics,
    ) -> WaitTimeSpec {
        let expr = match binding {
            Binding::Value(expr) => expr,
            Binding::Method { name, location } => {
                let raw = format!("def {}(...)", name);
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::UnresolvedExpression,
                        format!("wait time is computed by method `{}` and cannot be resolved statically", name),
                        location,
                    )
                    .with_entity(class_name),
                );
                return WaitTimeSpec::Unresolved { raw_expression: raw };
            }
        };

        match self.classify_wait_time(expr) {
            WaitShape::Range(low, high) => {
                if low > high || low < 0.0 {
                    let reason = if low > high {
                        format!("low bound {} is greater than high bound {}", low, high)
                    } else {
                        format!("bounds {} and {} must not be negative", low, high)
                    };
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::InvalidRange,
                            format!("invalid wait-time range `{}`: {}", expr.text, reason),
                            expr.location,
                        )
                        .with_entity(class_name),
                    );
                    WaitTimeSpec::Unresolved { raw_expression: expr.text.clone() }
                } else {
                    WaitTimeSpec::Range { low, high }
                }
            }
            WaitShape::Constant(value) => {
                if value < 0.0 {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::InvalidRange,
                            format!("invalid wait time `{}`: {} is negative", expr.text, value),
                            expr.location,
                        )
                        .with_entity(class_name),
                    );
                    WaitTimeSpec::Unresolved { raw_expression: expr.text.clone() }
                } else {
                    WaitTimeSpec::Constant { value }
                }
            }
            WaitShape::Unknown => {
                diagnostics.push(unresolved(
                    class_name,
                    &self.dialect.wait_time_attribute,
                    expr,
                ));
                WaitTimeSpec::Unresolved { raw_expression: expr.text.clone() }
            }
        }
    }

    fn classify_wait_time(&self, expr: &Expr) -> WaitShape {
        match &expr.kind {
            ExprKind::Call { func, args, keywords } if self.dialect.is_range_function(func) => {
                if !keywords.is_empty() || args.len() != 2 {
                    return WaitShape::Unknown;
                }
                match (literal::evaluate_number(&args[0]), literal::evaluate_number(&args[1])) {
                    (Some(low), Some(high)) => WaitShape::Range(low, high),
                    _ => WaitShape::Unknown,
                }
            }
            ExprKind::Call { func, args, keywords } if self.dialect.is_constant_function(func) => {
                if !keywords.is_empty() || args.len() != 1 {
                    return WaitShape::Unknown;
                }
                literal::evaluate_number(&args[0])
                    .map(WaitShape::Constant)
                    .unwrap_or(WaitShape::Unknown)
            }
            _ => literal::evaluate_number(expr)
                .map(WaitShape::Constant)
                .unwrap_or(WaitShape::Unknown),
        }
    }
}

enum WaitShape {
    Range(f64, f64),
    Constant(f64),
    Unknown,
}

/// Last statement in `body` that binds `name`, either by assignment or by a
/// method definition of the same name.
fn last_binding<'ast>(body: &'ast [Stmt], name: &str) -> Option<Binding<'ast>> {
    let mut found = None;
    for stmt in body {
        match &stmt.kind {
            StmtKind::Assign {
                targets,
                value: Some(value),
            } => {
                let binds = targets
                    .iter()
                    .any(|t| matches!(&t.kind, ExprKind::Name(n) if n == name));
                if binds {
                    found = Some(Binding::Value(value));
                }
            }
            StmtKind::FunctionDef(def) if def.name == name => {
                found = Some(Binding::Method {
                    name: &def.name,
                    location: stmt.location,
                });
            }
            _ => {}
        }
    }
    found
}

fn unresolved(class_name: &str, attribute: &str, expr: &Expr) -> Diagnostic {
    Diagnostic::new(
        DiagnosticCode::UnresolvedExpression,
        format!("`{}` value `{}` cannot be resolved to a constant", attribute, expr.text),
        expr.location,
    )
    .with_entity(class_name)
}
