use crate::domain::ast::Module;
use crate::domain::error::AdapterFailure;
use crate::domain::model::FileReport;

pub mod traffic_exporter;

/// Turns script source text into the syntax tree the extractor walks.
pub trait ScriptParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<Module, AdapterFailure>;
}

/// Renders per-file reports into one output document.
pub trait ReportExporter {
    fn render(&self, reports: &[FileReport]) -> std::io::Result<String>;

    fn export(&self, reports: &[FileReport], path: &str) -> std::io::Result<()> {
        std::fs::write(path, self.render(reports)?)
    }
}
