//! Declaration Scanner
//!
//! Finds the top-level classes that derive, directly or through other classes
//! in the same file, from a recognized root user type.
//!
//! Inheritance is treated as a reachability problem over a graph of class
//! names: a class reaches the root if one of its bases is a root name or names
//! an in-file class that reaches the root. Reachability is computed as a
//! monotone fixpoint, so declaration order and diamond-shaped hierarchies need
//! no special handling.

use crate::domain::ast::{ClassDef, ExprKind, Location, Module, StmtKind};
use crate::domain::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::domain::dialect::DialectConfig;
use std::collections::{HashMap, HashSet};

/// A class that chains to the root user type.
#[derive(Debug, Clone)]
pub struct UserClassDecl<'ast> {
    pub class: &'ast ClassDef,
    /// Immediate parent that leads to the root, as written.
    pub base_name: String,
    pub location: Location,
}

pub struct DeclarationScanner<'a> {
    dialect: &'a DialectConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl<'a> DeclarationScanner<'a> {
    pub fn new(dialect: &'a DialectConfig) -> Self {
        Self { dialect }
    }

    pub fn scan<'ast>(
        &self,
        module: &'ast Module,
        diagnostics: &mut Diagnostics,
    ) -> Vec<UserClassDecl<'ast>> {
        let classes: Vec<(&'ast ClassDef, Location)> = module
            .body
            .iter()
            .filter_map(|stmt| match &stmt.kind {
                StmtKind::ClassDef(class) => Some((class, stmt.location)),
                _ => None,
            })
            .collect();

        let edges = self.build_edges(&classes);
        let in_cycle = find_cycle_members(&edges);
        let intends_user = self.close_over_roots(&classes, &edges, &HashSet::new());
        let reaches_root = self.close_over_roots(&classes, &edges, &in_cycle);

        let mut decls = Vec::new();
        let mut seen_names: HashSet<&str> = HashSet::new();

        for (idx, &(class, location)) in classes.iter().enumerate() {
            if in_cycle.contains(&idx) {
                if intends_user[idx] || self.declares_tasks(class) {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::InheritanceCycle,
                            format!("class `{}` is part of an inheritance cycle", class.name),
                            location,
                        )
                        .with_entity(class.name.clone()),
                    );
                }
                continue;
            }

            if !reaches_root[idx] {
                if self.declares_tasks(class) {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::NonChainingBase,
                            format!(
                                "class `{}` declares tasks but does not derive from a recognized user type ({})",
                                class.name,
                                self.dialect.root_bases.join(", ")
                            ),
                            location,
                        )
                        .with_entity(class.name.clone()),
                    );
                }
                continue;
            }

            if !seen_names.insert(class.name.as_str()) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DuplicateClass,
                        format!("user class `{}` is declared more than once; the later declaration shadows the earlier one", class.name),
                        location,
                    )
                    .with_entity(class.name.clone()),
                );
            }

            let base_name = self
                .first_chaining_base(class, &edges[idx], &reaches_root)
                .unwrap_or_default();

            decls.push(UserClassDecl {
                class,
                base_name,
                location,
            });
        }

        tracing::debug!(
            classes = classes.len(),
            user_classes = decls.len(),
            "declaration scan finished"
        );
        decls
    }

    /// For each class, the in-file class each base refers to (parallel to `bases`).
    ///
    /// A base name refers to the latest same-named class declared before the
    /// referencing class, or failing that the first one declared after it.
    fn build_edges(&self, classes: &[(&ClassDef, Location)]) -> Vec<Vec<Option<usize>>> {
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, (class, _)) in classes.iter().enumerate() {
            by_name.entry(class.name.as_str()).or_default().push(idx);
        }

        classes
            .iter()
            .enumerate()
            .map(|(idx, (class, _))| {
                class
                    .bases
                    .iter()
                    .map(|base| {
                        let ExprKind::Name(name) = &base.kind else {
                            return None;
                        };
                        let candidates = by_name.get(name.as_str())?;
                        candidates
                            .iter()
                            .rev()
                            .find(|&&j| j < idx)
                            .or_else(|| candidates.iter().find(|&&j| j > idx))
                            .copied()
                    })
                    .collect()
            })
            .collect()
    }

    /// Classes that reach a root. Classes in `blocked` never reach and never
    /// carry reachability to their subclasses.
    fn close_over_roots(
        &self,
        classes: &[(&ClassDef, Location)],
        edges: &[Vec<Option<usize>>],
        blocked: &HashSet<usize>,
    ) -> Vec<bool> {
        let mut reaches = vec![false; classes.len()];
        let mut changed = true;
        while changed {
            changed = false;
            for (idx, (class, _)) in classes.iter().enumerate() {
                if reaches[idx] || blocked.contains(&idx) {
                    continue;
                }
                let chains = class.bases.iter().zip(&edges[idx]).any(|(base, target)| {
                    self.dialect.is_root_base(base) || target.is_some_and(|j| reaches[j])
                });
                if chains {
                    reaches[idx] = true;
                    changed = true;
                }
            }
        }
        reaches
    }

    fn first_chaining_base(
        &self,
        class: &ClassDef,
        edges: &[Option<usize>],
        reaches_root: &[bool],
    ) -> Option<String> {
        class
            .bases
            .iter()
            .zip(edges)
            .find(|(base, target)| {
                self.dialect.is_root_base(base) || target.is_some_and(|j| reaches_root[j])
            })
            .map(|(base, _)| base.dotted_name().unwrap_or_else(|| base.text.clone()))
    }

    fn declares_tasks(&self, class: &ClassDef) -> bool {
        class.body.iter().any(|stmt| match &stmt.kind {
            StmtKind::FunctionDef(def) => def.decorators.iter().any(|d| {
                let marker = match &d.kind {
                    ExprKind::Call { func, .. } => func.as_ref(),
                    _ => d,
                };
                self.dialect.is_task_marker(marker)
            }),
            _ => false,
        })
    }
}

/// Classes lying on a cycle of in-file inheritance edges.
fn find_cycle_members(edges: &[Vec<Option<usize>>]) -> HashSet<usize> {
    fn visit(
        node: usize,
        edges: &[Vec<Option<usize>>],
        colors: &mut [Color],
        stack: &mut Vec<usize>,
        members: &mut HashSet<usize>,
    ) {
        colors[node] = Color::Gray;
        stack.push(node);
        for target in edges[node].iter().flatten() {
            match colors[*target] {
                Color::White => visit(*target, edges, colors, stack, members),
                Color::Gray => {
                    if let Some(pos) = stack.iter().position(|n| n == target) {
                        members.extend(stack[pos..].iter().copied());
                    }
                }
                Color::Black => {}
            }
        }
        stack.pop();
        colors[node] = Color::Black;
    }

    let mut colors = vec![Color::White; edges.len()];
    let mut members = HashSet::new();
    let mut stack = Vec::new();
    for node in 0..edges.len() {
        if colors[node] == Color::White {
            visit(node, edges, &mut colors, &mut stack, &mut members);
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::TreeSitterPythonParser;
    use crate::ports::ScriptParser;

    fn scan(source: &str) -> (Vec<(String, String)>, Vec<Diagnostic>) {
        let module = TreeSitterPythonParser.parse(source).unwrap();
        let dialect = DialectConfig::default();
        let mut diagnostics = Diagnostics::new();
        let decls = DeclarationScanner::new(&dialect).scan(&module, &mut diagnostics);
        let names = decls
            .iter()
            .map(|d| (d.class.name.clone(), d.base_name.clone()))
            .collect();
        (names, diagnostics.into_vec())
    }

    #[test]
    fn test_direct_root_base() {
        let (decls, diags) = scan("class WebsiteUser(HttpUser):\n    pass\n");
        assert_eq!(decls, vec![("WebsiteUser".to_string(), "HttpUser".to_string())]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_transitive_chain_declared_out_of_order() {
        let source = r#"
class Shopper(BaseShopper):
    pass

class BaseShopper(locust.HttpUser):
    abstract = True
"#;
        let (decls, diags) = scan(source);
        assert_eq!(
            decls,
            vec![
                ("Shopper".to_string(), "BaseShopper".to_string()),
                ("BaseShopper".to_string(), "locust.HttpUser".to_string()),
            ]
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unrelated_classes_are_silent() {
        let source = r#"
class Helper:
    def build(self):
        return 1

class Payload(dict):
    pass
"#;
        let (decls, diags) = scan(source);
        assert!(decls.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_multiple_inheritance_picks_first_chaining_base() {
        let source = r#"
class Mixin:
    pass

class Api(Mixin, HttpUser):
    pass
"#;
        let (decls, _) = scan(source);
        assert_eq!(decls, vec![("Api".to_string(), "HttpUser".to_string())]);
    }

    #[test]
    fn test_cycle_between_plain_classes_is_silent() {
        let source = r#"
class A(B):
    pass

class B(A):
    pass
"#;
        let (decls, diags) = scan(source);
        assert!(decls.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_cycle_with_user_intent_is_reported_and_excluded() {
        let source = r#"
class A(B, HttpUser):
    pass

class B(A):
    pass

class C(A):
    pass
"#;
        let (decls, diags) = scan(source);
        assert!(decls.is_empty());
        let cycles: Vec<_> = diags
            .iter()
            .map(|d| (d.code, d.entity.as_deref()))
            .collect();
        assert_eq!(
            cycles,
            vec![
                (DiagnosticCode::InheritanceCycle, Some("A")),
                (DiagnosticCode::InheritanceCycle, Some("B")),
            ]
        );
    }

    #[test]
    fn test_cycle_member_declaring_tasks_is_reported() {
        let source = r#"
class A(B):
    @task
    def index(self):
        pass

class B(A):
    pass
"#;
        let (decls, diags) = scan(source);
        assert!(decls.is_empty());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::InheritanceCycle);
        assert_eq!(diags[0].entity.as_deref(), Some("A"));
    }

    #[test]
    fn test_task_class_without_root_is_reported() {
        let source = r#"
class Orphan(object):
    @task
    def index(self):
        self.client.get("/")
"#;
        let (decls, diags) = scan(source);
        assert!(decls.is_empty());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::NonChainingBase);
        assert_eq!(diags[0].entity.as_deref(), Some("Orphan"));
    }

    #[test]
    fn test_redeclared_user_class_is_kept_and_flagged() {
        let source = r#"
class U(HttpUser):
    pass

class U(HttpUser):
    pass
"#;
        let (decls, diags) = scan(source);
        assert_eq!(decls.len(), 2);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::DuplicateClass);
        assert_eq!(diags[0].location.line, 5);
    }

    #[test]
    fn test_self_named_base_refers_to_earlier_declaration() {
        let source = r#"
class U(HttpUser):
    pass

class U(U):
    pass
"#;
        let (decls, diags) = scan(source);
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[1].1, "U");
        assert!(diags.iter().all(|d| d.code != DiagnosticCode::InheritanceCycle));
    }
}
