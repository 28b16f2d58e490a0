use crate::domain::builder::ModelBuilder;
use crate::domain::dialect::DialectConfig;
use crate::domain::error::AdapterFailure;
use crate::domain::model::{Extraction, FileReport};
use crate::infrastructure::ScriptSource;
use crate::ports::ScriptParser;
use rayon::prelude::*;

/// Parses scripts through a `ScriptParser` and builds their scenario models.
pub struct ExtractUsecase<'a> {
    pub parser: &'a dyn ScriptParser,
    pub dialect: &'a DialectConfig,
}

impl<'a> ExtractUsecase<'a> {
    /// Extract one script. Only an adapter failure is an error; every
    /// structural problem is reported as a diagnostic.
    pub fn extract(&self, source: &str) -> Result<Extraction, AdapterFailure> {
        let module = self.parser.parse(source)?;
        Ok(ModelBuilder::new(self.dialect).build(&module))
    }

    /// Extract every script in parallel. Reports keep the order of `scripts`.
    pub fn extract_all(&self, scripts: &[ScriptSource]) -> Vec<FileReport> {
        scripts
            .par_iter()
            .map(|script| self.extract_report(script))
            .collect()
    }

    fn extract_report(&self, script: &ScriptSource) -> FileReport {
        if let Some(error) = &script.read_error {
            return FileReport::failed(script.path.clone(), format!("cannot read script: {}", error));
        }
        match self.extract(&script.content) {
            Ok(extraction) => {
                tracing::debug!(
                    path = %script.path,
                    user_classes = extraction.model.user_classes.len(),
                    diagnostics = extraction.diagnostics.len(),
                    "extracted script"
                );
                FileReport::from_extraction(script.path.clone(), extraction)
            }
            Err(failure) => {
                tracing::warn!(path = %script.path, error = %failure, "failed to parse script");
                FileReport::failed(script.path.clone(), failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::Module;

    struct FailingParser;

    impl ScriptParser for FailingParser {
        fn parse(&self, _source: &str) -> Result<Module, AdapterFailure> {
            Err(AdapterFailure::NoTree)
        }
    }

    struct EmptyParser;

    impl ScriptParser for EmptyParser {
        fn parse(&self, _source: &str) -> Result<Module, AdapterFailure> {
            Ok(Module::default())
        }
    }

    fn script(path: &str) -> ScriptSource {
        ScriptSource::new(path, "")
    }

    #[test]
    fn test_adapter_failure_becomes_failed_report() {
        let dialect = DialectConfig::default();
        let usecase = ExtractUsecase {
            parser: &FailingParser,
            dialect: &dialect,
        };
        let reports = usecase.extract_all(&[script("a.py")]);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_failed());
        assert_eq!(reports[0].failure.as_deref(), Some("parser returned no syntax tree"));
    }

    #[test]
    fn test_unreadable_script_fails_alone() {
        let dialect = DialectConfig::default();
        let usecase = ExtractUsecase {
            parser: &EmptyParser,
            dialect: &dialect,
        };
        let scripts = vec![
            script("a.py"),
            ScriptSource::unreadable("b.py", "stream did not contain valid UTF-8"),
        ];
        let reports = usecase.extract_all(&scripts);
        assert!(!reports[0].is_failed());
        assert_eq!(
            reports[1].failure.as_deref(),
            Some("cannot read script: stream did not contain valid UTF-8")
        );
    }

    #[test]
    fn test_reports_keep_input_order() {
        let dialect = DialectConfig::default();
        let usecase = ExtractUsecase {
            parser: &EmptyParser,
            dialect: &dialect,
        };
        let scripts: Vec<_> = (0..32).map(|i| script(&format!("s{}.py", i))).collect();
        let paths: Vec<_> = usecase
            .extract_all(&scripts)
            .into_iter()
            .map(|r| r.path)
            .collect();
        let expected: Vec<_> = scripts.into_iter().map(|s| s.path).collect();
        assert_eq!(paths, expected);
    }
}
