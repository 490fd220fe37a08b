//! Infix to postfix conversion (shunting-yard).

use super::ops::{builtin, Assoc, Operator};
use super::token::Token;
use crate::error::FormulaError;

/// Entries on the operator stack.
#[derive(Debug)]
enum Frame {
    Op(Operator),
    Paren,
    /// A function call whose `(` has been consumed. `args` counts the
    /// arguments seen so far.
    Call {
        name: String,
        declared: usize,
        args: usize,
    },
}

/// Reorder an infix token sequence into postfix order.
///
/// A `-` in operand position becomes [`Operator::Neg`]. Function tokens in the
/// output carry the number of arguments actually passed.
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>, FormulaError> {
    if tokens.is_empty() {
        return Err(syntax("empty expression"));
    }

    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Frame> = Vec::new();
    // True when the next token must start an operand.
    let mut expect_operand = true;
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        match token {
            Token::Number(_) | Token::Identifier(_) => {
                if !expect_operand {
                    return Err(syntax(format!("missing operator before '{token}'")));
                }
                output.push(token.clone());
                expect_operand = false;
            }
            Token::Function { name, arity } => {
                if !expect_operand {
                    return Err(syntax(format!("missing operator before '{name}'")));
                }
                if !matches!(iter.next(), Some(Token::LeftParen)) {
                    return Err(syntax(format!("function '{name}' must be followed by '('")));
                }
                if matches!(iter.peek(), Some(Token::RightParen)) {
                    iter.next();
                    output.push(close_call(name.clone(), *arity, 0)?);
                    expect_operand = false;
                } else {
                    stack.push(Frame::Call {
                        name: name.clone(),
                        declared: *arity,
                        args: 1,
                    });
                }
            }
            Token::LeftParen => {
                if !expect_operand {
                    return Err(syntax("missing operator before '('"));
                }
                stack.push(Frame::Paren);
            }
            Token::RightParen => {
                if expect_operand {
                    return Err(syntax("missing operand before ')'"));
                }
                loop {
                    match stack.pop() {
                        Some(Frame::Op(op)) => output.push(Token::Operator(op)),
                        Some(Frame::Paren) => break,
                        Some(Frame::Call {
                            name,
                            declared,
                            args,
                        }) => {
                            output.push(close_call(name, declared, args)?);
                            break;
                        }
                        None => return Err(syntax("unmatched ')'")),
                    }
                }
            }
            Token::Comma => {
                if expect_operand {
                    return Err(syntax("missing argument before ','"));
                }
                loop {
                    match stack.last_mut() {
                        Some(Frame::Call { args, .. }) => {
                            *args += 1;
                            break;
                        }
                        Some(Frame::Op(op)) => {
                            output.push(Token::Operator(*op));
                            stack.pop();
                        }
                        Some(Frame::Paren) | None => {
                            return Err(syntax("',' outside of a function call"))
                        }
                    }
                }
                expect_operand = true;
            }
            Token::Operator(op) => {
                if expect_operand {
                    match op {
                        // Prefix operator: nothing to its left can be popped.
                        Operator::Sub | Operator::Neg => stack.push(Frame::Op(Operator::Neg)),
                        _ => {
                            return Err(syntax(format!(
                                "missing operand before '{}'",
                                op.symbol()
                            )))
                        }
                    }
                    continue;
                }
                while let Some(&Frame::Op(top)) = stack.last() {
                    let pops = top.precedence() > op.precedence()
                        || (top.precedence() == op.precedence() && op.assoc() == Assoc::Left);
                    if !pops {
                        break;
                    }
                    output.push(Token::Operator(top));
                    stack.pop();
                }
                stack.push(Frame::Op(*op));
                expect_operand = true;
            }
        }
    }

    if expect_operand {
        return Err(syntax("unexpected end of expression"));
    }

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Op(op) => output.push(Token::Operator(op)),
            Frame::Paren | Frame::Call { .. } => return Err(syntax("unmatched '('")),
        }
    }

    Ok(output)
}

fn close_call(name: String, declared: usize, args: usize) -> Result<Token, FormulaError> {
    // Unknown names carry declared == 0 and are reported by the evaluator.
    if let Some(spec) = builtin(&name) {
        if spec.arity != args {
            return Err(syntax(format!(
                "{name} expects {} argument(s), got {args}",
                spec.arity
            )));
        }
    } else if declared != 0 && declared != args {
        return Err(syntax(format!(
            "{name} expects {declared} argument(s), got {args}"
        )));
    }
    Ok(Token::Function { name, arity: args })
}

fn syntax(message: impl Into<String>) -> FormulaError {
    FormulaError::Syntax(message.into())
}
