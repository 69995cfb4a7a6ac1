// src/resource/expr/mod.rs

//! The restricted expression language used in `requires` lines.
//!
//! Text is tokenized by [`lexer`], turned into an [`ast::Expr`] by
//! [`parser`] and interpreted against bound resource records by [`eval`].
//! Only literals, `<resource>.<field>` references, lists, comparisons,
//! membership tests, boolean connectives and the `len`/`int`/`float`/`bool`
//! conversions are accepted. Everything else is rejected when the
//! expression is parsed.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

use thiserror::Error;

pub use ast::{Builtin, CmpOp, Expr, Value};
pub use parser::parse;

/// Reasons an expression is rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("invalid number literal {text:?}")]
    InvalidNumber { text: String },

    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        offset: usize,
        expected: String,
    },

    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: String },

    #[error("call to {name:?} is not allowed (only len, int, float and bool)")]
    CallNotAllowed { name: String },

    #[error("bare name {name:?} is not allowed, use <resource>.<field>")]
    BareName { name: String },

    #[error("expression does not reference any resource")]
    NoResources,

    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}
