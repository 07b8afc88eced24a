//! This AST describes a parsed Orn language source file.
//!
//! A program is a single top-level scope. Scopes hold statements in
//! declared lexical order; a nested scope is itself a statement, so
//! closing an inner scope never reorders the siblings that follow it.
//!
//! Example source file:
//!
//! ```text
//! {
//!     x = 2 + 3 * 4;
//!     {
//!         y = x ^ 2;
//!     }
//!     while (x - 10) {
//!         x = x + 1;
//!         out = print(x);
//!     }
//!     if (y) r = print(sqrt(y));
//! }
//! ```
//!
//! Builtins such as `print` and `sqrt` are callable only inside an
//! expression; a statement is always a scope, a control construct, or
//! an assignment.

use std::fmt;

/// A binary arithmetic operator.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let glyph = match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
            BinOp::Pow => '^',
        };
        write!(f, "{}", glyph)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Expr {
    Num(f64),
    Var(String),
    /// A builtin keyword call such as `sqrt(x)` or `input()`-style reads.
    Call {
        name: String,
        arg: Box<Expr>,
    },
    Bin {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Clone, PartialEq, Debug)]
pub enum Stmt {
    Assign { name: String, value: Expr },
    If { cond: Expr, body: Block },
    While { cond: Expr, body: Block },
    /// A nested scope occupies a single statement slot in its parent.
    Scope(Block),
}

/// An ordered statement sequence, one per scope.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}
