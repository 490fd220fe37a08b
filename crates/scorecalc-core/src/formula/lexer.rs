//! Formula tokenizer.

use super::ops::{builtin, Operator};
use super::token::Token;
use crate::error::FormulaError;

/// Split a formula into tokens.
///
/// Performs no structural validation: `"2 +"` and `"(("` tokenize fine and are
/// rejected later by the converter.
pub fn tokenize(expression: &str) -> Result<Vec<Token>, FormulaError> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && next_is_digit(&chars, pos)) {
            let (value, end) = scan_number(&chars, pos)?;
            tokens.push(Token::Number(value));
            pos = end;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            let name: String = chars[start..pos].iter().collect();
            if next_significant(&chars, pos) == Some('(') {
                let arity = builtin(&name).map_or(0, |f| f.arity);
                tokens.push(Token::Function { name, arity });
            } else {
                tokens.push(Token::Identifier(name));
            }
            continue;
        }

        let token = match c {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            ',' => Token::Comma,
            other => match Operator::from_char(other) {
                Some(op) => Token::Operator(op),
                None => {
                    return Err(FormulaError::Lex {
                        character: other,
                        position: pos,
                    })
                }
            },
        };
        tokens.push(token);
        pos += 1;
    }

    Ok(tokens)
}

fn next_is_digit(chars: &[char], pos: usize) -> bool {
    chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit())
}

fn next_significant(chars: &[char], mut pos: usize) -> Option<char> {
    while pos < chars.len() && chars[pos].is_whitespace() {
        pos += 1;
    }
    chars.get(pos).copied()
}

/// Scan digits with at most one decimal point. Returns the value and the
/// index just past the run.
fn scan_number(chars: &[char], start: usize) -> Result<(f64, usize), FormulaError> {
    let mut pos = start;
    let mut seen_dot = false;
    while pos < chars.len() {
        match chars[pos] {
            d if d.is_ascii_digit() => pos += 1,
            '.' if !seen_dot => {
                seen_dot = true;
                pos += 1;
            }
            _ => break,
        }
    }
    let text: String = chars[start..pos].iter().collect();
    let value = text.parse::<f64>().map_err(|_| FormulaError::Lex {
        character: chars[start],
        position: start,
    })?;
    if !value.is_finite() {
        return Err(FormulaError::NonFinite(format!("literal at position {start}")));
    }
    Ok((value, pos))
}
