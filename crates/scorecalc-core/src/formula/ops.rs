//! Operator precedence and builtin function tables.
//!
//! The converter and evaluator consult these tables instead of hard-coding
//! precedence or function names, so adding a builtin is a one-line change.

use serde::{Deserialize, Serialize};

/// Arithmetic operators understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    /// Unary minus. Never produced by the tokenizer, only by the converter.
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// Static description of one operator.
#[derive(Debug, Clone, Copy)]
pub struct OperatorSpec {
    pub operator: Operator,
    pub symbol: &'static str,
    pub precedence: u8,
    pub assoc: Assoc,
    pub arity: usize,
}

pub const OPERATORS: &[OperatorSpec] = &[
    OperatorSpec {
        operator: Operator::Add,
        symbol: "+",
        precedence: 1,
        assoc: Assoc::Left,
        arity: 2,
    },
    OperatorSpec {
        operator: Operator::Sub,
        symbol: "-",
        precedence: 1,
        assoc: Assoc::Left,
        arity: 2,
    },
    OperatorSpec {
        operator: Operator::Mul,
        symbol: "*",
        precedence: 2,
        assoc: Assoc::Left,
        arity: 2,
    },
    OperatorSpec {
        operator: Operator::Div,
        symbol: "/",
        precedence: 2,
        assoc: Assoc::Left,
        arity: 2,
    },
    OperatorSpec {
        operator: Operator::Neg,
        symbol: "neg",
        precedence: 3,
        assoc: Assoc::Right,
        arity: 1,
    },
];

impl Operator {
    pub fn spec(self) -> &'static OperatorSpec {
        // Every variant has exactly one row in OPERATORS.
        match self {
            Operator::Add => &OPERATORS[0],
            Operator::Sub => &OPERATORS[1],
            Operator::Mul => &OPERATORS[2],
            Operator::Div => &OPERATORS[3],
            Operator::Neg => &OPERATORS[4],
        }
    }

    pub fn precedence(self) -> u8 {
        self.spec().precedence
    }

    pub fn assoc(self) -> Assoc {
        self.spec().assoc
    }

    pub fn arity(self) -> usize {
        self.spec().arity
    }

    pub fn symbol(self) -> &'static str {
        self.spec().symbol
    }

    /// Binary operator for a source character.
    pub fn from_char(c: char) -> Option<Operator> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }
}

/// Static description of one builtin function.
#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub arity: usize,
    /// Receives exactly `arity` arguments in source order.
    pub apply: fn(&[f64]) -> f64,
}

pub const FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec {
        name: "floor",
        arity: 1,
        apply: |a| a[0].floor(),
    },
    FunctionSpec {
        name: "ceil",
        arity: 1,
        apply: |a| a[0].ceil(),
    },
    // f64::round rounds half away from zero: round(2.5) == 3, round(-2.5) == -3.
    FunctionSpec {
        name: "round",
        arity: 1,
        apply: |a| a[0].round(),
    },
    FunctionSpec {
        name: "abs",
        arity: 1,
        apply: |a| a[0].abs(),
    },
    FunctionSpec {
        name: "sqrt",
        arity: 1,
        apply: |a| a[0].sqrt(),
    },
    FunctionSpec {
        name: "min",
        arity: 2,
        apply: |a| a[0].min(a[1]),
    },
    FunctionSpec {
        name: "max",
        arity: 2,
        apply: |a| a[0].max(a[1]),
    },
    FunctionSpec {
        name: "pow",
        arity: 2,
        apply: |a| a[0].powf(a[1]),
    },
];

/// Look up a builtin function by exact name.
pub fn builtin(name: &str) -> Option<&'static FunctionSpec> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_rows_match_variants() {
        for row in OPERATORS {
            assert_eq!(row.operator.spec().symbol, row.symbol);
        }
    }

    #[test]
    fn precedence_ordering() {
        assert!(Operator::Neg.precedence() > Operator::Mul.precedence());
        assert_eq!(Operator::Mul.precedence(), Operator::Div.precedence());
        assert!(Operator::Div.precedence() > Operator::Add.precedence());
        assert_eq!(Operator::Add.precedence(), Operator::Sub.precedence());
    }

    #[test]
    fn builtin_lookup() {
        assert_eq!(builtin("floor").map(|f| f.arity), Some(1));
        assert_eq!(builtin("max").map(|f| f.arity), Some(2));
        assert!(builtin("Floor").is_none());
        assert!(builtin("sin").is_none());
    }

    #[test]
    fn round_ties_away_from_zero() {
        let round = builtin("round").unwrap().apply;
        assert_eq!(round(&[2.5]), 3.0);
        assert_eq!(round(&[-2.5]), -3.0);
        assert_eq!(round(&[0.5]), 1.0);
        assert_eq!(round(&[4.4]), 4.0);
    }
}
