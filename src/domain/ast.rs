// AST data structures for Locust Lens.
// These types represent a parsed Python script in a form suitable for static
// extraction. Only the shapes the extractor inspects are modeled precisely;
// everything else is kept as `Other` so nested calls are still reachable.

use serde::Serialize;
use std::fmt;

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Root of one script file.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub body: Vec<Stmt>,
}

/// A statement with its position.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    ClassDef(ClassDef),
    FunctionDef(FunctionDef),
    /// `a = b = value`, `a: T = value`, or a bare annotation (`value == None`).
    Assign {
        targets: Vec<Expr>,
        value: Option<Expr>,
    },
    Expr(Expr),
    Return(Option<Expr>),
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    /// `for` and `while`; `header` holds the target/iterable or the condition.
    Loop {
        header: Vec<Expr>,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<Vec<Stmt>>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
    With {
        items: Vec<Expr>,
        body: Vec<Stmt>,
    },
    /// Any statement the extractor does not model (imports, match, raise, ...).
    Other {
        exprs: Vec<Expr>,
        blocks: Vec<Vec<Stmt>>,
    },
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub decorators: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub is_async: bool,
    pub decorators: Vec<Expr>,
    pub body: Vec<Stmt>,
}

/// An expression together with its position and raw source text.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: Location,
    pub text: String,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Name(String),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    NoneLiteral,
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Unmodeled expression; children are kept for call-site discovery.
    Other(Vec<Expr>),
    /// Expression whose inside must not be searched (lambdas).
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Invert,
    Not,
}

#[derive(Debug, Clone)]
pub struct Keyword {
    pub name: String,
    pub value: Expr,
}

impl Expr {
    /// Dotted name of a `Name` / `Attribute` chain (`locust.task`), if it is one.
    pub fn dotted_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Name(name) => Some(name.clone()),
            ExprKind::Attribute { value, attr } => {
                value.dotted_name().map(|prefix| format!("{}.{}", prefix, attr))
            }
            _ => None,
        }
    }

    /// Final identifier of a `Name` / `Attribute` expression (`self.client` -> `client`).
    pub fn last_segment(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            ExprKind::Attribute { attr, .. } => Some(attr),
            _ => None,
        }
    }

    /// Sub-expressions in source order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Attribute { value, .. } => vec![value.as_ref()],
            ExprKind::Call { func, args, keywords } => {
                let mut out: Vec<&Expr> = vec![func.as_ref()];
                out.extend(args.iter());
                out.extend(keywords.iter().map(|k| &k.value));
                // keywords may be interleaved with positionals
                out.sort_by_key(|e| e.location);
                out
            }
            ExprKind::Unary { operand, .. } => vec![operand.as_ref()],
            ExprKind::Other(children) => children.iter().collect(),
            _ => Vec::new(),
        }
    }
}

impl Keyword {
    pub fn find<'a>(keywords: &'a [Keyword], name: &str) -> Option<&'a Keyword> {
        keywords.iter().find(|k| k.name == name)
    }
}
