//! The formula engine.
//!
//! A formula goes through four stages, each of which fails fast:
//!
//! 1. [`tokenize`] splits the source into [`Token`]s.
//! 2. [`substitute`] replaces bound variable names with their values.
//! 3. [`to_postfix`] reorders the tokens with the shunting-yard algorithm.
//! 4. [`evaluate_postfix`] runs the postfix sequence on a value stack.
//!
//! [`evaluate`] chains all four.

pub mod eval;
pub mod lexer;
pub mod ops;
pub mod postfix;
pub mod substitute;
pub mod token;

pub use eval::evaluate_postfix;
pub use lexer::tokenize;
pub use ops::{builtin, Operator};
pub use postfix::to_postfix;
pub use substitute::{substitute, Bindings};
pub use token::Token;

use crate::error::FormulaError;

/// Evaluate a formula against a set of variable bindings.
pub fn evaluate(expression: &str, bindings: &Bindings) -> Result<f64, FormulaError> {
    let tokens = tokenize(expression)?;
    let substituted = substitute(&tokens, bindings)?;
    let postfix = to_postfix(&substituted)?;
    let value = evaluate_postfix(&postfix)?;
    tracing::trace!(expression, postfix = %token::render(&postfix), value, "evaluated formula");
    Ok(value)
}

/// Names a formula reads as variables, in source order without duplicates.
///
/// Fails if the formula does not tokenize or is structurally invalid.
pub fn free_variables(expression: &str) -> Result<Vec<String>, FormulaError> {
    let tokens = tokenize(expression)?;
    to_postfix(&tokens)?;
    let mut names: Vec<String> = Vec::new();
    for token in tokens {
        if let Token::Identifier(name) = token {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> Result<f64, FormulaError> {
        evaluate(src, &Bindings::new())
    }

    fn vars(pairs: &[(&str, f64)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn end_to_end_arithmetic() {
        assert_eq!(eval("2 * (3 + 4) - floor(5.7)").unwrap(), 9.0);
    }

    #[test]
    fn rounding_functions() {
        assert_eq!(eval("ceil(4.6)").unwrap(), 5.0);
        assert_eq!(eval("floor(4.6)").unwrap(), 4.0);
        assert_eq!(eval("round(4.6)").unwrap(), 5.0);
        assert_eq!(eval("round(2.5)").unwrap(), 3.0);
        assert_eq!(eval("round(-2.5)").unwrap(), -3.0);
    }

    #[test]
    fn functions_through_bindings() {
        let bindings = vars(&[("val", 4.6)]);
        assert_eq!(evaluate("ceil(val)", &bindings).unwrap(), 5.0);
        assert_eq!(evaluate("floor(val)", &bindings).unwrap(), 4.0);
        assert_eq!(evaluate("round(val)", &bindings).unwrap(), 5.0);
    }

    #[test]
    fn nested_functions() {
        assert_eq!(eval("round(ceil(4.2) + floor(3.8))").unwrap(), 8.0);
    }

    #[test]
    fn variable_arithmetic() {
        let bindings = vars(&[("distance", 100.0), ("factor", 2.5)]);
        assert_eq!(evaluate("distance * factor", &bindings).unwrap(), 250.0);
    }

    #[test]
    fn substituted_formula_from_question() {
        let bindings = vars(&[("x", 10.0), ("y", 3.0), ("z", 2.3)]);
        // floor(3.33) * 2 + ceil(2.3) = 6 + 3
        assert_eq!(
            evaluate("floor(x / y) * 2 + ceil(z)", &bindings).unwrap(),
            9.0
        );
    }

    #[test]
    fn two_argument_functions() {
        assert_eq!(eval("max(2, 7) - min(2, 7)").unwrap(), 5.0);
        assert_eq!(eval("pow(2, 10)").unwrap(), 1024.0);
        assert_eq!(eval("abs(-3) + sqrt(16)").unwrap(), 7.0);
    }

    #[test]
    fn unary_minus() {
        assert_eq!(eval("-3 + 5").unwrap(), 2.0);
        assert_eq!(eval("2 * -3").unwrap(), -6.0);
        assert_eq!(eval("-(2 + 3) * 2").unwrap(), -10.0);
        assert_eq!(eval("4 - -1").unwrap(), 5.0);
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(eval("1 / 0"), Err(FormulaError::DivisionByZero));
        let bindings = vars(&[("d", 0.0)]);
        assert_eq!(
            evaluate("10 / (d * 3)", &bindings),
            Err(FormulaError::DivisionByZero)
        );
    }

    #[test]
    fn dangling_operator_is_syntax_error() {
        assert!(matches!(eval("2 +"), Err(FormulaError::Syntax(_))));
    }

    #[test]
    fn unbound_variable_is_unknown_symbol() {
        assert_eq!(
            eval("speed * 2"),
            Err(FormulaError::UnknownSymbol("speed".into()))
        );
        assert_eq!(
            eval("sin(1)"),
            Err(FormulaError::UnknownSymbol("sin".into()))
        );
    }

    #[test]
    fn out_of_range_literal_is_non_finite() {
        let huge = format!("1{}", "0".repeat(400));
        assert!(matches!(eval(&huge), Err(FormulaError::NonFinite(_))));
        assert!(matches!(eval(&format!("{huge} - {huge}")), Err(FormulaError::NonFinite(_))));
    }

    #[test]
    fn repeated_evaluation_is_bit_identical() {
        let bindings = vars(&[("a", 0.1), ("b", 0.2), ("c", 3.7)]);
        let formula = "round(a + b * c) / 3 + a / c";
        let first = evaluate(formula, &bindings).unwrap();
        for _ in 0..100 {
            let again = evaluate(formula, &bindings).unwrap();
            assert_eq!(first.to_bits(), again.to_bits());
        }
    }

    #[test]
    fn free_variables_in_order() {
        assert_eq!(
            free_variables("floor(x / y) * x + ceil(z)").unwrap(),
            vec!["x", "y", "z"]
        );
        assert!(free_variables("2 +").is_err());
    }
}
