use crate::domain::ast::Location;
use thiserror::Error;

/// The syntax adapter could not produce a usable tree. Fatal for one file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterFailure {
    #[error("failed to load Python grammar: {0}")]
    Grammar(String),

    #[error("parser returned no syntax tree")]
    NoTree,

    #[error("syntax error at {location}: `{snippet}`")]
    Syntax { location: Location, snippet: String },

    #[error("malformed `{kind}` node at {location}")]
    Malformed { kind: String, location: Location },

    #[error("nesting deeper than {limit} levels at {location}")]
    TooDeep { limit: usize, location: Location },
}

impl AdapterFailure {
    pub fn location(&self) -> Option<Location> {
        match self {
            AdapterFailure::Syntax { location, .. }
            | AdapterFailure::Malformed { location, .. }
            | AdapterFailure::TooDeep { location, .. } => Some(*location),
            _ => None,
        }
    }
}
