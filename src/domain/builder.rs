//! Model Builder
//!
//! Composes the declaration scanner, the attribute resolver and the task
//! collector into one `ScenarioModel`. Every problem found along the way is a
//! non-fatal diagnostic; the builder always returns a best-effort model.

use crate::domain::ast::Module;
use crate::domain::attributes::AttributeResolver;
use crate::domain::diagnostic::Diagnostics;
use crate::domain::dialect::DialectConfig;
use crate::domain::model::{Extraction, ScenarioModel, UserClassModel};
use crate::domain::scanner::DeclarationScanner;
use crate::domain::tasks::TaskCollector;

pub struct ModelBuilder<'a> {
    dialect: &'a DialectConfig,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(dialect: &'a DialectConfig) -> Self {
        Self { dialect }
    }

    pub fn build(&self, module: &Module) -> Extraction {
        let mut diagnostics = Diagnostics::new();

        let decls = DeclarationScanner::new(self.dialect).scan(module, &mut diagnostics);
        let resolver = AttributeResolver::new(self.dialect);
        let collector = TaskCollector::new(self.dialect);

        let user_classes = decls
            .into_iter()
            .map(|decl| {
                let class = decl.class;
                let attrs = resolver.resolve(&class.name, &class.body, &mut diagnostics);
                let tasks = collector.collect(&class.name, &class.body, &mut diagnostics);

                UserClassModel {
                    name: class.name.clone(),
                    base_name: decl.base_name,
                    wait_time: attrs.wait_time,
                    tasks,
                    weight: attrs.weight,
                    host: attrs.host,
                    is_abstract: attrs.is_abstract,
                    location: decl.location,
                }
            })
            .collect();

        let model = ScenarioModel { user_classes };
        tracing::debug!(
            user_classes = model.user_classes.len(),
            calls = model.call_count(),
            diagnostics = diagnostics.len(),
            "scenario model built"
        );

        Extraction {
            model,
            diagnostics: diagnostics.into_vec(),
        }
    }
}
