//! Postfix stack machine.

use super::ops::{builtin, Operator};
use super::token::Token;
use crate::error::FormulaError;

/// Evaluate a postfix token sequence to a single finite value.
pub fn evaluate_postfix(tokens: &[Token]) -> Result<f64, FormulaError> {
    let mut stack: Vec<f64> = Vec::with_capacity(tokens.len());

    for token in tokens {
        let value = match token {
            Token::Number(n) => finite(*n, "literal")?,
            Token::Identifier(name) => return Err(FormulaError::UnknownSymbol(name.clone())),
            Token::Operator(op) => apply_operator(*op, &mut stack)?,
            Token::Function { name, arity } => apply_function(name, *arity, &mut stack)?,
            Token::LeftParen | Token::RightParen | Token::Comma => {
                return Err(FormulaError::MalformedExpression(format!(
                    "unexpected '{token}' in postfix input"
                )))
            }
        };
        stack.push(value);
    }

    match stack.as_slice() {
        [value] => Ok(*value),
        [] => Err(FormulaError::MalformedExpression(
            "expression produced no value".into(),
        )),
        rest => Err(FormulaError::MalformedExpression(format!(
            "{} values left on the stack",
            rest.len()
        ))),
    }
}

/// Pop `count` operands, returned in source (left-to-right) order.
fn pop_operands(stack: &mut Vec<f64>, count: usize, what: &str) -> Result<Vec<f64>, FormulaError> {
    if stack.len() < count {
        return Err(FormulaError::MalformedExpression(format!(
            "'{what}' needs {count} operand(s), found {}",
            stack.len()
        )));
    }
    Ok(stack.split_off(stack.len() - count))
}

fn apply_operator(op: Operator, stack: &mut Vec<f64>) -> Result<f64, FormulaError> {
    let operands = pop_operands(stack, op.arity(), op.symbol())?;
    let result = match (op, operands.as_slice()) {
        (Operator::Neg, [a]) => -a,
        (Operator::Add, [a, b]) => a + b,
        (Operator::Sub, [a, b]) => a - b,
        (Operator::Mul, [a, b]) => a * b,
        (Operator::Div, [_, b]) if *b == 0.0 => return Err(FormulaError::DivisionByZero),
        (Operator::Div, [a, b]) => a / b,
        _ => {
            return Err(FormulaError::MalformedExpression(format!(
                "operator '{}' received {} operand(s)",
                op.symbol(),
                operands.len()
            )))
        }
    };
    finite(result, op.symbol())
}

fn apply_function(name: &str, arity: usize, stack: &mut Vec<f64>) -> Result<f64, FormulaError> {
    let spec = builtin(name).ok_or_else(|| FormulaError::UnknownSymbol(name.to_string()))?;
    if spec.arity != arity {
        return Err(FormulaError::MalformedExpression(format!(
            "{name} takes {} argument(s), postfix token says {arity}",
            spec.arity
        )));
    }
    let args = pop_operands(stack, spec.arity, name)?;
    finite((spec.apply)(&args), name)
}

fn finite(value: f64, source: &str) -> Result<f64, FormulaError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite(source.to_string()))
    }
}
