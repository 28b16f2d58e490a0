//! Literal evaluation.
//!
//! Reduces an expression to a constant only when it is a literal. Calls,
//! names, operators and everything else are refused, with a single exception:
//! unary `+`/`-` directly applied to a numeric literal is folded so that
//! `-1` reads as the number it is.

use crate::domain::ast::{Expr, ExprKind, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
}

impl Literal {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Int(v) => Some(*v as f64),
            Literal::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Evaluate `expr` if it is a literal.
pub fn evaluate(expr: &Expr) -> Option<Literal> {
    match &expr.kind {
        ExprKind::Int(v) => Some(Literal::Int(*v)),
        ExprKind::Float(v) => Some(Literal::Float(*v)),
        ExprKind::Str(s) => Some(Literal::Str(s.clone())),
        ExprKind::Bool(b) => Some(Literal::Bool(*b)),
        ExprKind::NoneLiteral => Some(Literal::None),
        ExprKind::Unary { op, operand } => fold_sign(*op, operand),
        _ => None,
    }
}

/// Numeric literal (int or float), sign included.
pub fn evaluate_number(expr: &Expr) -> Option<f64> {
    evaluate(expr).and_then(|lit| lit.as_number())
}

pub fn evaluate_str(expr: &Expr) -> Option<String> {
    match evaluate(expr)? {
        Literal::Str(s) => Some(s),
        _ => None,
    }
}

fn fold_sign(op: UnaryOp, operand: &Expr) -> Option<Literal> {
    match (op, &operand.kind) {
        (UnaryOp::Plus, ExprKind::Int(v)) => Some(Literal::Int(*v)),
        (UnaryOp::Plus, ExprKind::Float(v)) => Some(Literal::Float(*v)),
        (UnaryOp::Minus, ExprKind::Int(v)) => v.checked_neg().map(Literal::Int),
        (UnaryOp::Minus, ExprKind::Float(v)) => Some(Literal::Float(-*v)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::Location;

    fn expr(kind: ExprKind) -> Expr {
        Expr {
            kind,
            location: Location::new(1, 1),
            text: String::new(),
        }
    }

    #[test]
    fn test_plain_literals() {
        assert_eq!(evaluate(&expr(ExprKind::Int(3))), Some(Literal::Int(3)));
        assert_eq!(evaluate(&expr(ExprKind::Float(0.5))), Some(Literal::Float(0.5)));
        assert_eq!(
            evaluate(&expr(ExprKind::Str("/".to_string()))),
            Some(Literal::Str("/".to_string()))
        );
        assert_eq!(evaluate(&expr(ExprKind::Bool(true))), Some(Literal::Bool(true)));
        assert_eq!(evaluate(&expr(ExprKind::NoneLiteral)), Some(Literal::None));
    }

    #[test]
    fn test_negative_numbers_fold() {
        let neg = expr(ExprKind::Unary {
            op: UnaryOp::Minus,
            operand: Box::new(expr(ExprKind::Int(2))),
        });
        assert_eq!(evaluate(&neg), Some(Literal::Int(-2)));
        assert_eq!(evaluate_number(&neg), Some(-2.0));
    }

    #[test]
    fn test_non_literals_are_refused() {
        assert_eq!(evaluate(&expr(ExprKind::Name("WAIT".to_string()))), None);

        let nested_sign = expr(ExprKind::Unary {
            op: UnaryOp::Minus,
            operand: Box::new(expr(ExprKind::Name("x".to_string()))),
        });
        assert_eq!(evaluate(&nested_sign), None);

        let call = expr(ExprKind::Call {
            func: Box::new(expr(ExprKind::Name("int".to_string()))),
            args: vec![expr(ExprKind::Str("3".to_string()))],
            keywords: vec![],
        });
        assert_eq!(evaluate(&call), None);

        let not_number = expr(ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(expr(ExprKind::Int(0))),
        });
        assert_eq!(evaluate(&not_number), None);
    }

    #[test]
    fn test_typed_helpers() {
        assert_eq!(evaluate_number(&expr(ExprKind::Str("1".to_string()))), None);
        assert_eq!(evaluate_str(&expr(ExprKind::Int(1))), None);
        assert_eq!(evaluate_str(&expr(ExprKind::Str("/a".to_string()))), Some("/a".to_string()));
    }
}
