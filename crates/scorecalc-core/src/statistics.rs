//! Aggregate statistics over a batch of scored sessions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::breakdown::ResultBreakdown;
use crate::model::RespondentCategory;

/// Aggregate statistics across a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Sessions submitted to the batch.
    pub sessions: usize,
    /// Sessions whose every answer scored.
    pub complete: usize,
    /// Sessions with a breakdown but at least one failed answer.
    pub partial: usize,
    /// Sessions that produced no breakdown at all.
    pub failed: usize,
    /// Totals summary over complete sessions.
    pub totals: Option<TotalSummary>,
    /// Per-question statistics, keyed by question id.
    pub per_question: BTreeMap<i64, QuestionStats>,
    /// Mean total per respondent category.
    pub per_category: BTreeMap<RespondentCategory, CategoryStats>,
}

/// Min/mean/max of session totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Statistics for one question across all sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question: String,
    /// Scored answers seen for this question.
    pub answers: usize,
    /// Mean per-session subtotal.
    pub mean: f64,
}

/// Statistics for one respondent category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub sessions: usize,
    pub mean_total: f64,
}

/// Compute batch statistics from the breakdowns and the count of sessions
/// that failed outright.
pub fn compute_batch_stats(breakdowns: &[ResultBreakdown], failed_sessions: usize) -> BatchStats {
    let totals: Vec<f64> = breakdowns.iter().filter_map(|b| b.total()).collect();

    let totals_summary = if totals.is_empty() {
        None
    } else {
        Some(TotalSummary {
            mean: mean(&totals),
            min: totals.iter().copied().fold(f64::INFINITY, f64::min),
            max: totals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    };

    // (name, answers, per-session subtotals)
    let mut questions: BTreeMap<i64, (String, usize, Vec<f64>)> = BTreeMap::new();
    for breakdown in breakdowns {
        for (id, subtotal) in breakdown.by_question() {
            if !subtotal.value.is_finite() {
                continue;
            }
            let entry = questions
                .entry(id)
                .or_insert_with(|| (subtotal.question.clone(), 0, Vec::new()));
            entry.1 += subtotal.answers;
            entry.2.push(subtotal.value);
        }
    }
    let per_question = questions
        .into_iter()
        .map(|(id, (question, answers, subtotals))| {
            (
                id,
                QuestionStats {
                    question,
                    answers,
                    mean: mean(&subtotals),
                },
            )
        })
        .collect();

    let mut categories: BTreeMap<RespondentCategory, Vec<f64>> = BTreeMap::new();
    for breakdown in breakdowns {
        if let Some(total) = breakdown.total() {
            categories
                .entry(breakdown.respondent())
                .or_default()
                .push(total);
        }
    }
    let per_category = categories
        .into_iter()
        .map(|(category, values)| {
            (
                category,
                CategoryStats {
                    sessions: values.len(),
                    mean_total: mean(&values),
                },
            )
        })
        .collect();

    let complete = breakdowns.iter().filter(|b| b.is_complete()).count();

    BatchStats {
        sessions: breakdowns.len() + failed_sessions,
        complete,
        partial: breakdowns.len() - complete,
        failed: failed_sessions,
        totals: totals_summary,
        per_question,
        per_category,
    }
}

/// Mean of finite values. Dividing first keeps the result finite.
fn mean(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    values.iter().map(|v| v / n).sum()
}
