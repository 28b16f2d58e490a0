//! Domain layer: syntax tree, scenario model and the analyses that connect them.

pub mod ast;
pub mod attributes;
pub mod builder;
pub mod diagnostic;
pub mod dialect;
pub mod error;
pub mod literal;
pub mod model;
pub mod scanner;
pub mod tasks;
pub mod traffic_mix;

pub use builder::ModelBuilder;
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use dialect::DialectConfig;
pub use error::AdapterFailure;
pub use model::{Extraction, ScenarioModel};
