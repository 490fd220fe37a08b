//! Per-session result breakdown and aggregation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, FormulaError};
use crate::model::{AnswerKey, RespondentCategory};

/// How per-answer values combine into a session total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
    Min,
    Max,
}

impl Aggregation {
    /// Combine values. `Sum` of nothing is 0; the others are undefined on
    /// an empty slice.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Aggregation::Sum => Some(values.iter().sum()),
            Aggregation::Mean if values.is_empty() => None,
            Aggregation::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Aggregation::Min => values.iter().copied().reduce(f64::min),
            Aggregation::Max => values.iter().copied().reduce(f64::max),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Sum => write!(f, "sum"),
            Aggregation::Mean => write!(f, "mean"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "mean" | "avg" | "average" => Ok(Aggregation::Mean),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            other => Err(format!("unknown aggregation: {other}")),
        }
    }
}

/// What happened to one answer's formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Scored { value: f64 },
    Failed { kind: ErrorKind, message: String },
}

impl AnswerOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            AnswerOutcome::Scored { value } => Some(*value),
            AnswerOutcome::Failed { .. } => None,
        }
    }
}

impl From<Result<f64, FormulaError>> for AnswerOutcome {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(value) => AnswerOutcome::Scored { value },
            Err(e) => AnswerOutcome::Failed {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

/// One row of a breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub key: AnswerKey,
    /// Question name, for display.
    pub question: String,
    pub formula: String,
    pub outcome: AnswerOutcome,
}

/// Sum of the scored answers of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSubtotal {
    pub question: String,
    pub value: f64,
    pub answers: usize,
}

/// Scoring result for one session.
///
/// Built once by [`ResultBreakdown::fold`] and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBreakdown {
    session_id: i64,
    respondent: RespondentCategory,
    aggregation: Aggregation,
    entries: Vec<BreakdownEntry>,
    /// `None` when any answer failed, the aggregation is undefined, or the
    /// aggregate is not finite.
    total: Option<f64>,
    /// Sum of the scored entries only. `None` when that sum overflows.
    partial_total: Option<f64>,
    failed: usize,
    /// Every answer scored but aggregating them left the `f64` range.
    #[serde(default)]
    overflowed: bool,
}

#[derive(Default)]
struct Tally {
    entries: Vec<BreakdownEntry>,
    values: Vec<f64>,
    failed: usize,
}

impl ResultBreakdown {
    /// Fold an ordered sequence of per-answer entries into a breakdown.
    pub fn fold<I>(
        session_id: i64,
        respondent: RespondentCategory,
        aggregation: Aggregation,
        entries: I,
    ) -> Self
    where
        I: IntoIterator<Item = BreakdownEntry>,
    {
        let tally = entries.into_iter().fold(Tally::default(), |mut tally, entry| {
            match entry.outcome.value() {
                Some(value) => tally.values.push(value),
                None => tally.failed += 1,
            }
            tally.entries.push(entry);
            tally
        });

        let aggregate = if tally.failed == 0 {
            aggregation.apply(&tally.values)
        } else {
            None
        };
        let overflowed = aggregate.is_some_and(|t| !t.is_finite());
        let partial_total = Some(tally.values.iter().sum::<f64>()).filter(|t| t.is_finite());

        Self {
            session_id,
            respondent,
            aggregation,
            entries: tally.entries,
            total: aggregate.filter(|t| t.is_finite()),
            partial_total,
            failed: tally.failed,
            overflowed,
        }
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    pub fn respondent(&self) -> RespondentCategory {
        self.respondent
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn entries(&self) -> &[BreakdownEntry] {
        &self.entries
    }

    pub fn total(&self) -> Option<f64> {
        self.total
    }

    pub fn partial_total(&self) -> Option<f64> {
        self.partial_total
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// True when every answer scored and the total is a finite number.
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && !self.overflowed
    }

    /// Value of a specific answer, if it scored.
    pub fn value_of(&self, key: &AnswerKey) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| &e.key == key)
            .and_then(|e| e.outcome.value())
    }

    /// Scored values grouped by question id.
    pub fn by_question(&self) -> BTreeMap<i64, QuestionSubtotal> {
        let mut map: BTreeMap<i64, QuestionSubtotal> = BTreeMap::new();
        for entry in &self.entries {
            let Some(value) = entry.outcome.value() else {
                continue;
            };
            let subtotal = map
                .entry(entry.key.question_id)
                .or_insert_with(|| QuestionSubtotal {
                    question: entry.question.clone(),
                    value: 0.0,
                    answers: 0,
                });
            subtotal.value += value;
            subtotal.answers += 1;
        }
        map
    }
}
