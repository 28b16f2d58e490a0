// Infrastructure implementations for Locust Lens.

pub mod concurrency;
pub mod dialect_loader;
pub mod exporters;
pub mod python_parser;
pub mod script_loader;

pub use exporters::{JsonExporter, TextExporter};
pub use python_parser::TreeSitterPythonParser;
pub use script_loader::{ScriptLoader, ScriptSource};
