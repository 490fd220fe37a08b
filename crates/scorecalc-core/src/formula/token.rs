//! Lexical tokens shared by every pipeline stage.

use std::fmt;

use super::ops::Operator;

/// One lexical unit of a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    /// A name that is not a function call: a variable, or an unknown symbol.
    Identifier(String),
    Operator(Operator),
    /// A name immediately followed by `(`.
    ///
    /// The tokenizer fills `arity` from the builtin table (0 when unknown);
    /// the converter rewrites it to the number of arguments actually passed.
    Function { name: String, arity: usize },
    LeftParen,
    RightParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Operator(op) => write!(f, "{}", op.symbol()),
            Token::Function { name, .. } => write!(f, "{name}"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// Render a token sequence as space-separated text (handy for postfix output).
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
