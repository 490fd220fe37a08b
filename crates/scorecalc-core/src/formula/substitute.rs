//! Variable substitution.

use std::collections::BTreeMap;

use super::token::Token;
use crate::error::FormulaError;

/// Variable name → stringified numeric value for one evaluation.
pub type Bindings = BTreeMap<String, String>;

/// Replace every identifier that names a binding with its numeric value.
///
/// Function names, operators, parens, and unbound identifiers pass through
/// untouched. Substituted values are never re-tokenized.
pub fn substitute(tokens: &[Token], bindings: &Bindings) -> Result<Vec<Token>, FormulaError> {
    tokens
        .iter()
        .map(|token| match token {
            Token::Identifier(name) => match bindings.get(name) {
                Some(raw) => parse_binding(name, raw).map(Token::Number),
                None => Ok(token.clone()),
            },
            other => Ok(other.clone()),
        })
        .collect()
}

fn parse_binding(name: &str, raw: &str) -> Result<f64, FormulaError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(FormulaError::InvalidBinding {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}
