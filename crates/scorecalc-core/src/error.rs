//! Formula and calculation error types.
//!
//! Every stage of the formula pipeline fails fast with a [`FormulaError`].
//! The calculator wraps a failing answer into a [`CalculationError`] so the
//! caller knows which answer of the session broke.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::AnswerKey;

/// Errors produced while tokenizing, substituting, converting, or evaluating
/// a formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// The tokenizer met a character outside the grammar.
    #[error("unexpected character '{character}' at position {position}")]
    Lex { character: char, position: usize },

    /// Structurally malformed input (unbalanced parens, missing operands, ...).
    #[error("syntax error: {0}")]
    Syntax(String),

    /// An identifier with no binding, or a call to a function that does not exist.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("division by zero")]
    DivisionByZero,

    /// The postfix stack invariant was violated.
    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    /// An operation produced infinity or NaN.
    #[error("non-finite result from {0}")]
    NonFinite(String),

    /// A binding value that does not parse as a finite number.
    #[error("invalid value '{value}' for variable '{name}'")]
    InvalidBinding { name: String, value: String },

    /// The same variable name was bound twice for one evaluation.
    #[error("variable '{0}' is bound more than once")]
    DuplicateBinding(String),
}

impl FormulaError {
    /// Stable classification of this error, used in serialized breakdowns.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::Lex { .. } => ErrorKind::Lex,
            FormulaError::Syntax(_) => ErrorKind::Syntax,
            FormulaError::UnknownSymbol(_) => ErrorKind::UnknownSymbol,
            FormulaError::DivisionByZero => ErrorKind::DivisionByZero,
            FormulaError::MalformedExpression(_) => ErrorKind::MalformedExpression,
            FormulaError::NonFinite(_) => ErrorKind::NonFinite,
            FormulaError::InvalidBinding { .. } | FormulaError::DuplicateBinding(_) => {
                ErrorKind::Binding
            }
        }
    }
}

/// Coarse category of a [`FormulaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Lex,
    Syntax,
    UnknownSymbol,
    DivisionByZero,
    MalformedExpression,
    NonFinite,
    Binding,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Lex => "lex",
            ErrorKind::Syntax => "syntax",
            ErrorKind::UnknownSymbol => "unknown_symbol",
            ErrorKind::DivisionByZero => "division_by_zero",
            ErrorKind::MalformedExpression => "malformed_expression",
            ErrorKind::NonFinite => "non_finite",
            ErrorKind::Binding => "binding",
        };
        write!(f, "{s}")
    }
}

/// Errors raised by the calculator for a whole session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    /// One answer's formula failed and the failure policy aborts the session.
    #[error("answer {key} failed: {source}")]
    Answer {
        key: AnswerKey,
        #[source]
        source: FormulaError,
    },

    /// Every answer scored but the session total is not a finite number.
    #[error("session {session_id} total failed: {source}")]
    Total {
        session_id: i64,
        #[source]
        source: FormulaError,
    },
}

impl CalculationError {
    /// The answer that caused the failure, when a single answer did.
    pub fn key(&self) -> Option<&AnswerKey> {
        match self {
            CalculationError::Answer { key, .. } => Some(key),
            CalculationError::Total { .. } => None,
        }
    }
}
