//! Structural diagnostics.
//!
//! Every deviation from the expected script shape is recorded here and the
//! extraction keeps going. Diagnostics never abort a run.

use crate::domain::ast::Location;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier for each kind of structural problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// A value could not be reduced to a literal.
    UnresolvedExpression,
    /// More than one task marker on the same function.
    AmbiguousWeight,
    /// Weight is zero, negative, non-integer, or passed in an unsupported shape.
    InvalidWeight,
    /// Range bounds out of order or negative.
    InvalidRange,
    /// Class looks like a user class but never reaches a root user type.
    NonChainingBase,
    /// In-file classes inherit from each other in a loop.
    InheritanceCycle,
    /// A user class name is declared twice.
    DuplicateClass,
    /// `client.request(...)` with a verb outside the configured set.
    UnknownHttpMethod,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UnresolvedExpression => "unresolved-expression",
            DiagnosticCode::AmbiguousWeight => "ambiguous-weight",
            DiagnosticCode::InvalidWeight => "invalid-weight",
            DiagnosticCode::InvalidRange => "invalid-range",
            DiagnosticCode::NonChainingBase => "non-chaining-base",
            DiagnosticCode::InheritanceCycle => "inheritance-cycle",
            DiagnosticCode::DuplicateClass => "duplicate-class",
            DiagnosticCode::UnknownHttpMethod => "unknown-http-method",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::InvalidWeight
            | DiagnosticCode::InvalidRange
            | DiagnosticCode::InheritanceCycle => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub location: Location,
    /// Offending entity, e.g. `WebsiteUser` or `WebsiteUser.index`.
    pub entity: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the code's default severity.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            location,
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}[{}]: ", self.location, self.severity, self.code)?;
        if let Some(entity) = &self.entity {
            write!(f, "{}: ", entity)?;
        }
        f.write_str(&self.message)
    }
}

/// Ordered collector handed to each extraction component.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
