//! Tree-sitter Python adapter
//!
//! Parses script text with `tree-sitter-python` and lowers the concrete syntax
//! tree into the extractor's own `domain::ast`. Statements and expressions the
//! extractor does not inspect are kept as `Other` so calls nested in them stay
//! reachable.

use crate::domain::ast::{
    ClassDef, Expr, ExprKind, FunctionDef, Keyword, Location, Module, Stmt, StmtKind, UnaryOp,
};
use crate::domain::error::AdapterFailure;
use crate::ports::ScriptParser;
use std::cell::Cell;
use std::num::IntErrorKind;
use tree_sitter::{Node, Parser};

type Result<T> = std::result::Result<T, AdapterFailure>;

const SNIPPET_LEN: usize = 40;

/// Deepest statement or expression nesting that is lowered.
pub const MAX_NESTING: usize = 200;

/// Stateless; a fresh `tree_sitter::Parser` is created for every script.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitterPythonParser;

impl ScriptParser for TreeSitterPythonParser {
    fn parse(&self, source: &str) -> Result<Module> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| AdapterFailure::Grammar(e.to_string()))?;
        let tree = parser.parse(source, None).ok_or(AdapterFailure::NoTree)?;

        let lowering = Lowering {
            src: source.as_bytes(),
            depth: Cell::new(0),
        };
        let root = tree.root_node();
        if root.has_error() {
            return Err(lowering.syntax_failure(root));
        }
        Ok(Module {
            body: lowering.lower_block(root)?,
        })
    }
}

struct Lowering<'s> {
    src: &'s [u8],
    depth: Cell<usize>,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.src).unwrap_or("")
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>> {
        node.child_by_field_name(name)
            .ok_or_else(|| AdapterFailure::Malformed {
                kind: node.kind().to_string(),
                location: location(node),
            })
    }

    /// Runs `lower` one nesting level deeper, failing past `MAX_NESTING`.
    fn nested<T>(&self, node: Node, lower: impl FnOnce() -> Result<T>) -> Result<T> {
        let depth = self.depth.get() + 1;
        if depth > MAX_NESTING {
            return Err(AdapterFailure::TooDeep {
                limit: MAX_NESTING,
                location: location(node),
            });
        }
        self.depth.set(depth);
        let lowered = lower();
        self.depth.set(depth - 1);
        lowered
    }

    fn syntax_failure(&self, root: Node) -> AdapterFailure {
        let node = first_error(root).unwrap_or(root);
        let snippet: String = self
            .text(node)
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(SNIPPET_LEN)
            .collect();
        AdapterFailure::Syntax {
            location: location(node),
            snippet,
        }
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn lower_block(&self, node: Node) -> Result<Vec<Stmt>> {
        self.nested(node, || {
            let mut stmts = Vec::new();
            for child in named_children(node) {
                if child.kind() == "comment" {
                    continue;
                }
                stmts.push(self.lower_stmt(child)?);
            }
            Ok(stmts)
        })
    }

    fn lower_stmt(&self, node: Node) -> Result<Stmt> {
        let kind = match node.kind() {
            "class_definition" => StmtKind::ClassDef(self.lower_class(node, Vec::new())?),
            "function_definition" => StmtKind::FunctionDef(self.lower_function(node, Vec::new())?),
            "decorated_definition" => return self.lower_decorated(node),
            "expression_statement" => self.lower_expression_statement(node)?,
            "return_statement" => {
                let value = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() != "comment")
                    .map(|c| self.lower_expr(c))
                    .transpose()?;
                StmtKind::Return(value)
            }
            "if_statement" => self.lower_if(node)?,
            "for_statement" => StmtKind::Loop {
                header: vec![
                    self.lower_expr(self.field(node, "left")?)?,
                    self.lower_expr(self.field(node, "right")?)?,
                ],
                body: self.lower_block(self.field(node, "body")?)?,
                orelse: self.lower_else(node)?,
            },
            "while_statement" => StmtKind::Loop {
                header: vec![self.lower_expr(self.field(node, "condition")?)?],
                body: self.lower_block(self.field(node, "body")?)?,
                orelse: self.lower_else(node)?,
            },
            "try_statement" => self.lower_try(node)?,
            "with_statement" => self.lower_with(node)?,
            _ => {
                let mut exprs = Vec::new();
                let mut blocks = Vec::new();
                self.collect_other(node, &mut exprs, &mut blocks)?;
                StmtKind::Other { exprs, blocks }
            }
        };
        Ok(Stmt {
            kind,
            location: location(node),
        })
    }

    fn lower_decorated(&self, node: Node) -> Result<Stmt> {
        let mut decorators = Vec::new();
        for child in named_children(node) {
            if child.kind() != "decorator" {
                continue;
            }
            let expr = named_children(child)
                .into_iter()
                .find(|c| c.kind() != "comment")
                .ok_or_else(|| AdapterFailure::Malformed {
                    kind: child.kind().to_string(),
                    location: location(child),
                })?;
            decorators.push(self.lower_expr(expr)?);
        }

        let definition = self.field(node, "definition")?;
        let kind = match definition.kind() {
            "class_definition" => StmtKind::ClassDef(self.lower_class(definition, decorators)?),
            "function_definition" => {
                StmtKind::FunctionDef(self.lower_function(definition, decorators)?)
            }
            other => {
                return Err(AdapterFailure::Malformed {
                    kind: other.to_string(),
                    location: location(definition),
                })
            }
        };
        Ok(Stmt {
            kind,
            location: location(definition),
        })
    }

    fn lower_class(&self, node: Node, decorators: Vec<Expr>) -> Result<ClassDef> {
        let name = self.text(self.field(node, "name")?).to_string();

        let mut bases = Vec::new();
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            for arg in named_children(superclasses) {
                match arg.kind() {
                    // metaclass=..., total=False
                    "keyword_argument" | "comment" => {}
                    _ => bases.push(self.lower_expr(arg)?),
                }
            }
        }

        Ok(ClassDef {
            name,
            bases,
            decorators,
            body: self.lower_block(self.field(node, "body")?)?,
        })
    }

    fn lower_function(&self, node: Node, decorators: Vec<Expr>) -> Result<FunctionDef> {
        let is_async = node.child(0).is_some_and(|c| c.kind() == "async");
        Ok(FunctionDef {
            name: self.text(self.field(node, "name")?).to_string(),
            is_async,
            decorators,
            body: self.lower_block(self.field(node, "body")?)?,
        })
    }

    fn lower_expression_statement(&self, node: Node) -> Result<StmtKind> {
        let children: Vec<Node> = named_children(node)
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .collect();

        match children.as_slice() {
            [single] if single.kind() == "assignment" => self.lower_assignment(*single),
            [single] if single.kind() == "augmented_assignment" => Ok(StmtKind::Other {
                exprs: vec![
                    self.lower_expr(self.field(*single, "left")?)?,
                    self.lower_expr(self.field(*single, "right")?)?,
                ],
                blocks: Vec::new(),
            }),
            [single] => Ok(StmtKind::Expr(self.lower_expr(*single)?)),
            // `a, b` as a statement
            _ => Ok(StmtKind::Expr(Expr {
                kind: ExprKind::Other(self.lower_all(&children)?),
                location: location(node),
                text: self.text(node).to_string(),
            })),
        }
    }

    /// `a = b = value` arrives as nested assignments; flatten the targets.
    fn lower_assignment(&self, node: Node) -> Result<StmtKind> {
        let mut targets = Vec::new();
        let mut current = node;
        loop {
            targets.push(self.lower_expr(self.field(current, "left")?)?);
            match current.child_by_field_name("right") {
                Some(right) if right.kind() == "assignment" => current = right,
                Some(right) => {
                    return Ok(StmtKind::Assign {
                        targets,
                        value: Some(self.lower_expr(right)?),
                    })
                }
                None => return Ok(StmtKind::Assign { targets, value: None }),
            }
        }
    }

    fn lower_if(&self, node: Node) -> Result<StmtKind> {
        let test = self.lower_expr(self.field(node, "condition")?)?;
        let body = self.lower_block(self.field(node, "consequence")?)?;

        let mut cursor = node.walk();
        let alternatives: Vec<Node> = node
            .children_by_field_name("alternative", &mut cursor)
            .collect();

        // elif chains nest as `If` statements inside `orelse`
        let mut orelse = Vec::new();
        for alt in alternatives.iter().rev() {
            match alt.kind() {
                "else_clause" => orelse = self.lower_block(self.field(*alt, "body")?)?,
                "elif_clause" => {
                    let elif = Stmt {
                        kind: StmtKind::If {
                            test: self.lower_expr(self.field(*alt, "condition")?)?,
                            body: self.lower_block(self.field(*alt, "consequence")?)?,
                            orelse: std::mem::take(&mut orelse),
                        },
                        location: location(*alt),
                    };
                    orelse = vec![elif];
                }
                _ => {}
            }
        }

        Ok(StmtKind::If { test, body, orelse })
    }

    /// Body of the `else` clause of a loop, if any.
    fn lower_else(&self, node: Node) -> Result<Vec<Stmt>> {
        match node.child_by_field_name("alternative") {
            Some(alt) => self.lower_block(self.field(alt, "body")?),
            None => Ok(Vec::new()),
        }
    }

    fn lower_try(&self, node: Node) -> Result<StmtKind> {
        let body = self.lower_block(self.field(node, "body")?)?;
        let mut handlers = Vec::new();
        let mut orelse = Vec::new();
        let mut finalbody = Vec::new();

        for clause in named_children(node) {
            match clause.kind() {
                "except_clause" | "except_group_clause" => handlers.push(self.clause_block(clause)?),
                "else_clause" => orelse = self.lower_block(self.field(clause, "body")?)?,
                "finally_clause" => finalbody = self.clause_block(clause)?,
                _ => {}
            }
        }

        Ok(StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        })
    }

    /// The block child of a clause that has no `body` field.
    fn clause_block(&self, clause: Node) -> Result<Vec<Stmt>> {
        match named_children(clause).into_iter().find(|c| c.kind() == "block") {
            Some(block) => self.lower_block(block),
            None => Ok(Vec::new()),
        }
    }

    fn lower_with(&self, node: Node) -> Result<StmtKind> {
        let mut items = Vec::new();
        for clause in named_children(node) {
            if clause.kind() != "with_clause" {
                continue;
            }
            for item in named_children(clause) {
                if item.kind() == "with_item" {
                    items.push(self.lower_expr(self.field(item, "value")?)?);
                }
            }
        }
        Ok(StmtKind::With {
            items,
            body: self.lower_block(self.field(node, "body")?)?,
        })
    }

    /// Flattens an unmodeled statement into its expressions and nested blocks.
    fn collect_other(
        &self,
        node: Node,
        exprs: &mut Vec<Expr>,
        blocks: &mut Vec<Vec<Stmt>>,
    ) -> Result<()> {
        for child in named_children(node) {
            match child.kind() {
                "comment" => {}
                "block" => blocks.push(self.lower_block(child)?),
                kind if kind.ends_with("_clause") || kind.ends_with("_statement") => {
                    self.collect_other(child, exprs, blocks)?
                }
                _ => exprs.push(self.lower_expr(child)?),
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn lower_all(&self, nodes: &[Node]) -> Result<Vec<Expr>> {
        nodes.iter().map(|n| self.lower_expr(*n)).collect()
    }

    fn lower_expr(&self, node: Node) -> Result<Expr> {
        self.nested(node, || self.lower_expr_kind(node))
    }

    fn lower_expr_kind(&self, node: Node) -> Result<Expr> {
        let kind = match node.kind() {
            "identifier" => ExprKind::Name(self.text(node).to_string()),
            "attribute" => ExprKind::Attribute {
                value: Box::new(self.lower_expr(self.field(node, "object")?)?),
                attr: self.text(self.field(node, "attribute")?).to_string(),
            },
            "call" => self.lower_call(node)?,
            "integer" => parse_int(self.text(node))
                .map(ExprKind::Int)
                .unwrap_or(ExprKind::Other(Vec::new())),
            "float" => parse_float(self.text(node))
                .map(ExprKind::Float)
                .unwrap_or(ExprKind::Other(Vec::new())),
            "true" => ExprKind::Bool(true),
            "false" => ExprKind::Bool(false),
            "none" => ExprKind::NoneLiteral,
            "string" => self.lower_string(node)?,
            "concatenated_string" => self.lower_concatenated(node)?,
            "unary_operator" => {
                let op = match self.text(self.field(node, "operator")?) {
                    "+" => UnaryOp::Plus,
                    "-" => UnaryOp::Minus,
                    _ => UnaryOp::Invert,
                };
                ExprKind::Unary {
                    op,
                    operand: Box::new(self.lower_expr(self.field(node, "argument")?)?),
                }
            }
            "not_operator" => ExprKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.lower_expr(self.field(node, "argument")?)?),
            },
            "parenthesized_expression" => {
                let inner = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() != "comment");
                match inner {
                    Some(inner) => return self.lower_expr(inner),
                    None => ExprKind::Other(Vec::new()),
                }
            }
            "lambda" => ExprKind::Opaque,
            _ => {
                let children: Vec<Node> = named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() != "comment")
                    .collect();
                ExprKind::Other(self.lower_all(&children)?)
            }
        };

        Ok(Expr {
            kind,
            location: location(node),
            text: self.text(node).to_string(),
        })
    }

    fn lower_call(&self, node: Node) -> Result<ExprKind> {
        let func = Box::new(self.lower_expr(self.field(node, "function")?)?);
        let arguments = self.field(node, "arguments")?;

        let mut args = Vec::new();
        let mut keywords = Vec::new();
        if arguments.kind() == "argument_list" {
            for arg in named_children(arguments) {
                match arg.kind() {
                    "comment" => {}
                    "keyword_argument" => keywords.push(Keyword {
                        name: self.text(self.field(arg, "name")?).to_string(),
                        value: self.lower_expr(self.field(arg, "value")?)?,
                    }),
                    _ => args.push(self.lower_expr(arg)?),
                }
            }
        } else {
            // f(x for x in xs)
            args.push(self.lower_expr(arguments)?);
        }

        Ok(ExprKind::Call { func, args, keywords })
    }

    fn lower_string(&self, node: Node) -> Result<ExprKind> {
        let parts = named_children(node);
        let prefix = parts
            .iter()
            .find(|c| c.kind() == "string_start")
            .map(|c| self.text(*c).trim_end_matches(['"', '\'']).to_ascii_lowercase())
            .unwrap_or_default();

        let interpolations: Vec<Node> = parts
            .iter()
            .copied()
            .filter(|c| c.kind() == "interpolation")
            .collect();
        if !interpolations.is_empty() {
            let mut exprs = Vec::new();
            for interpolation in interpolations {
                if let Some(expr) = interpolation.child_by_field_name("expression") {
                    exprs.push(self.lower_expr(expr)?);
                }
            }
            return Ok(ExprKind::Other(exprs));
        }
        if prefix.contains('b') {
            return Ok(ExprKind::Other(Vec::new()));
        }

        let raw = prefix.contains('r');
        let mut value = String::new();
        for part in parts {
            match part.kind() {
                "string_content" => value.push_str(self.text(part)),
                "escape_sequence" if raw => value.push_str(self.text(part)),
                "escape_sequence" => value.push_str(&decode_escape(self.text(part))),
                // `{{` inside an f-string
                "escape_interpolation" => value.push_str(self.text(part).get(..1).unwrap_or("")),
                _ => {}
            }
        }
        Ok(ExprKind::Str(value))
    }

    fn lower_concatenated(&self, node: Node) -> Result<ExprKind> {
        let parts: Vec<Node> = named_children(node)
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .collect();
        let lowered = self.lower_all(&parts)?;

        let mut joined = String::new();
        for part in &lowered {
            match &part.kind {
                ExprKind::Str(s) => joined.push_str(s),
                _ => return Ok(ExprKind::Other(lowered)),
            }
        }
        Ok(ExprKind::Str(joined))
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn location(node: Node) -> Location {
    let pos = node.start_position();
    Location::new(pos.row + 1, pos.column + 1)
}

/// First error or missing node in document order.
fn first_error(root: Node) -> Option<Node> {
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            pending.extend(children.into_iter().rev());
        }
    }
    None
}

fn parse_int(text: &str) -> Option<i64> {
    let cleaned = text.replace('_', "").to_ascii_lowercase();
    if cleaned.ends_with('j') {
        return None;
    }
    let (digits, radix) = if let Some(rest) = cleaned.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = cleaned.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = cleaned.strip_prefix("0b") {
        (rest, 2)
    } else {
        (cleaned.as_str(), 10)
    };
    match i64::from_str_radix(digits, radix) {
        Ok(value) => Some(value),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(i64::MAX),
        Err(_) => None,
    }
}

fn parse_float(text: &str) -> Option<f64> {
    let cleaned = text.replace('_', "");
    if cleaned.ends_with(['j', 'J']) {
        return None;
    }
    cleaned.parse().ok()
}

/// Decodes one escape sequence; unknown escapes are kept verbatim.
fn decode_escape(seq: &str) -> String {
    let Some(body) = seq.strip_prefix('\\') else {
        return seq.to_string();
    };
    let simple = match body {
        "\n" | "\r\n" => Some(""),
        "\\" => Some("\\"),
        "'" => Some("'"),
        "\"" => Some("\""),
        "n" => Some("\n"),
        "t" => Some("\t"),
        "r" => Some("\r"),
        "0" => Some("\0"),
        "a" => Some("\u{07}"),
        "b" => Some("\u{08}"),
        "f" => Some("\u{0c}"),
        "v" => Some("\u{0b}"),
        _ => None,
    };
    if let Some(decoded) = simple {
        return decoded.to_string();
    }

    let code = match body.chars().next() {
        Some('x') | Some('u') | Some('U') => u32::from_str_radix(&body[1..], 16).ok(),
        Some(c) if c.is_digit(8) => u32::from_str_radix(body, 8).ok(),
        _ => None,
    };
    code.and_then(char::from_u32)
        .map(String::from)
        .unwrap_or_else(|| seq.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::concurrency::WORKER_STACK_SIZE;

    fn parse(source: &str) -> Module {
        TreeSitterPythonParser.parse(source).unwrap()
    }

    fn first_expr(source: &str) -> Expr {
        match parse(source).body.remove(0).kind {
            StmtKind::Expr(expr) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_class_with_bases_and_decorated_method() {
        let module = parse("class A(locust.HttpUser, metaclass=M):\n    @task(2)\n    def go(self):\n        pass\n");
        let StmtKind::ClassDef(class) = &module.body[0].kind else {
            panic!("expected class");
        };
        assert_eq!(class.name, "A");
        assert_eq!(class.bases.len(), 1);
        assert_eq!(class.bases[0].dotted_name().as_deref(), Some("locust.HttpUser"));

        let method = &class.body[0];
        assert_eq!(method.location, Location::new(3, 5));
        let StmtKind::FunctionDef(def) = &method.kind else {
            panic!("expected function");
        };
        assert_eq!(def.name, "go");
        assert!(!def.is_async);
        assert_eq!(def.decorators[0].text, "task(2)");
    }

    #[test]
    fn test_async_function() {
        let module = parse("async def fetch():\n    await x\n");
        let StmtKind::FunctionDef(def) = &module.body[0].kind else {
            panic!("expected function");
        };
        assert!(def.is_async);
    }

    #[test]
    fn test_chained_assignment_flattens_targets() {
        let module = parse("a = b = 3\n");
        let StmtKind::Assign { targets, value } = &module.body[0].kind else {
            panic!("expected assignment");
        };
        let names: Vec<_> = targets.iter().filter_map(|t| t.dotted_name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(matches!(value.as_ref().map(|v| &v.kind), Some(ExprKind::Int(3))));
    }

    #[test]
    fn test_annotated_assignment() {
        let module = parse("wait_time: float = 2.5\nhost: str\n");
        let StmtKind::Assign { value, .. } = &module.body[0].kind else {
            panic!("expected assignment");
        };
        assert!(matches!(value.as_ref().map(|v| &v.kind), Some(ExprKind::Float(f)) if *f == 2.5));
        assert!(matches!(&module.body[1].kind, StmtKind::Assign { value: None, .. }));
    }

    #[test]
    fn test_string_literals() {
        assert!(matches!(first_expr("'/a\\tb'\n").kind, ExprKind::Str(s) if s == "/a\tb"));
        assert!(matches!(first_expr("r'\\d+'\n").kind, ExprKind::Str(s) if s == "\\d+"));
        assert!(matches!(first_expr("'/a' '/b'\n").kind, ExprKind::Str(s) if s == "/a/b"));
        assert!(matches!(first_expr("f'/plain'\n").kind, ExprKind::Str(s) if s == "/plain"));
        assert!(matches!(first_expr("f'/x/{y}'\n").kind, ExprKind::Other(children) if children.len() == 1));
        assert!(matches!(first_expr("b'raw'\n").kind, ExprKind::Other(_)));
    }

    #[test]
    fn test_numeric_literals() {
        assert!(matches!(first_expr("1_000\n").kind, ExprKind::Int(1000)));
        assert!(matches!(first_expr("0x1F\n").kind, ExprKind::Int(31)));
        assert!(matches!(first_expr("0b101\n").kind, ExprKind::Int(5)));
        assert!(matches!(first_expr("99999999999999999999999\n").kind, ExprKind::Int(i64::MAX)));
        assert!(matches!(first_expr("10j\n").kind, ExprKind::Other(_)));
        let neg = first_expr("-(2)\n");
        assert!(matches!(neg.kind, ExprKind::Unary { op: UnaryOp::Minus, .. }));
    }

    #[test]
    fn test_call_arguments_and_keywords() {
        let expr = first_expr("self.client.get('/', name='home', **extra)\n");
        let ExprKind::Call { func, args, keywords } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(func.dotted_name().as_deref(), Some("self.client.get"));
        assert_eq!(args.len(), 2);
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].name, "name");
        assert_eq!(expr.location, Location::new(1, 1));
    }

    #[test]
    fn test_elif_chain_nests_in_orelse() {
        let module = parse("if a:\n    pass\nelif b:\n    pass\nelse:\n    x()\n");
        let StmtKind::If { orelse, .. } = &module.body[0].kind else {
            panic!("expected if");
        };
        let StmtKind::If { orelse: inner, .. } = &orelse[0].kind else {
            panic!("expected elif");
        };
        assert!(matches!(&inner[0].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn test_lambda_is_opaque() {
        assert!(matches!(first_expr("lambda: f()\n").kind, ExprKind::Opaque));
    }

    #[test]
    fn test_syntax_error_is_reported_with_location() {
        let err = TreeSitterPythonParser
            .parse("class A(HttpUser):\n    pass\n\n)))\n")
            .unwrap_err();
        match err {
            AdapterFailure::Syntax { location, .. } => assert_eq!(location.line, 4),
            other => panic!("expected syntax failure, got {:?}", other),
        }
    }

    fn parse_on_worker_stack(source: String) -> Result<Module> {
        std::thread::Builder::new()
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || TreeSitterPythonParser.parse(&source))
            .unwrap()
            .join()
            .unwrap()
    }

    fn parenthesized(depth: usize) -> String {
        format!("wait_time = {}1{}\n", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn test_deep_nesting_fails_the_file() {
        match parse_on_worker_stack(parenthesized(3000)) {
            Err(AdapterFailure::TooDeep { limit, location }) => {
                assert_eq!(limit, MAX_NESTING);
                assert_eq!(location.line, 1);
            }
            other => panic!("expected nesting failure, got {:?}", other),
        }
    }

    #[test]
    fn test_nesting_below_limit_is_lowered() {
        let module = parse_on_worker_stack(parenthesized(150)).unwrap();
        let StmtKind::Assign { value, .. } = &module.body[0].kind else {
            panic!("expected assignment");
        };
        assert!(matches!(value.as_ref().map(|v| &v.kind), Some(ExprKind::Int(1))));
    }

    #[test]
    fn test_deep_block_nesting_fails_the_file() {
        let mut source = String::new();
        for level in 0..MAX_NESTING + 1 {
            source.push_str(&"    ".repeat(level));
            source.push_str("if x:\n");
        }
        source.push_str(&"    ".repeat(MAX_NESTING + 1));
        source.push_str("pass\n");
        assert!(matches!(
            parse_on_worker_stack(source),
            Err(AdapterFailure::TooDeep { .. })
        ));
    }

    #[test]
    fn test_escape_decoding() {
        assert_eq!(decode_escape("\\n"), "\n");
        assert_eq!(decode_escape("\\x41"), "A");
        assert_eq!(decode_escape("\\u00e9"), "é");
        assert_eq!(decode_escape("\\101"), "A");
        assert_eq!(decode_escape("\\N{DASH}"), "\\N{DASH}");
    }
}
