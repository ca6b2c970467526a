//! Syntax definition.

use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Neg(Box<Expr>),
    Paren(Box<Expr>),
    Num(f64),
    /// Stands in for input skipped by error recovery.
    Error,
}

impl Expr {
    /// Evaluate the expression, or `None` if it contains a recovered error.
    pub fn eval(&self) -> Option<f64> {
        Some(match self {
            Self::Binary { op, lhs, rhs } => {
                let (lhs, rhs) = (lhs.eval()?, rhs.eval()?);
                match op {
                    BinOp::Add => lhs + rhs,
                    BinOp::Sub => lhs - rhs,
                    BinOp::Mul => lhs * rhs,
                    BinOp::Div => lhs / rhs,
                    BinOp::Pow => lhs.powf(rhs),
                }
            }
            Self::Neg(expr) => -expr.eval()?,
            Self::Paren(expr) => expr.eval()?,
            Self::Num(n) => *n,
            Self::Error => return None,
        })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary { op, lhs, rhs } => write!(f, "({} {} {})", op.symbol(), lhs, rhs),
            Self::Neg(expr) => write!(f, "(neg {})", expr),
            Self::Paren(expr) => write!(f, "{}", expr),
            Self::Num(n) => write!(f, "{}", n),
            Self::Error => write!(f, "<error>"),
        }
    }
}

/// A value on the parse stack: either a raw token or a parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Token(String),
    Expr(Box<Expr>),
}

impl Value {
    pub fn into_expr(self) -> Option<Box<Expr>> {
        match self {
            Self::Expr(expr) => Some(expr),
            Self::Token(..) => None,
        }
    }
}
