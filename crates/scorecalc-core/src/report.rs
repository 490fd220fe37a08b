//! Batch report types with JSON persistence and change detection.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::breakdown::ResultBreakdown;
use crate::config::CalculatorConfig;
use crate::model::AnswerKey;
use crate::statistics::BatchStats;

/// The result of scoring a batch of sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Calculator settings the batch was scored with.
    pub calculator: CalculatorConfig,
    /// One breakdown per session that produced one, ordered by session id.
    pub breakdowns: Vec<ResultBreakdown>,
    /// Sessions that produced no breakdown.
    pub failures: Vec<SessionFailure>,
    pub stats: BatchStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// A session that could not be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFailure {
    pub session_id: i64,
    /// The answer that aborted the session, when one did.
    pub answer: Option<AnswerKey>,
    pub message: String,
}

impl BatchReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BatchReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Breakdown of one session, if it scored.
    pub fn breakdown(&self, session_id: i64) -> Option<&ResultBreakdown> {
        self.breakdowns.iter().find(|b| b.session_id() == session_id)
    }

    /// Compare this report against a baseline, session by session.
    ///
    /// A session counts as changed when its total moved by more than
    /// `threshold`, or when it gained or lost a total.
    pub fn compare(&self, baseline: &BatchReport, threshold: f64) -> ComparisonReport {
        let totals = |report: &BatchReport| -> BTreeMap<i64, Option<f64>> {
            let mut map: BTreeMap<i64, Option<f64>> = report
                .breakdowns
                .iter()
                .map(|b| (b.session_id(), b.total()))
                .collect();
            for failure in &report.failures {
                map.entry(failure.session_id).or_insert(None);
            }
            map
        };

        let baseline_totals = totals(baseline);
        let current_totals = totals(self);

        let mut changes = Vec::new();
        let mut unchanged = 0usize;
        let mut new_sessions = Vec::new();

        for (&session_id, &current) in &current_totals {
            let Some(&previous) = baseline_totals.get(&session_id) else {
                new_sessions.push(session_id);
                continue;
            };
            let changed = match (previous, current) {
                (Some(b), Some(c)) => (c - b).abs() > threshold,
                (None, None) => false,
                _ => true,
            };
            if changed {
                changes.push(TotalChange {
                    session_id,
                    baseline: previous,
                    current,
                    delta: previous.zip(current).map(|(b, c)| c - b),
                });
            } else {
                unchanged += 1;
            }
        }

        let removed_sessions = baseline_totals
            .keys()
            .filter(|id| !current_totals.contains_key(id))
            .copied()
            .collect();

        ComparisonReport {
            changes,
            unchanged,
            new_sessions,
            removed_sessions,
        }
    }
}

/// Result of comparing two batch reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Sessions whose total changed.
    pub changes: Vec<TotalChange>,
    /// Sessions with no significant change.
    pub unchanged: usize,
    /// Sessions in current but not baseline.
    pub new_sessions: Vec<i64>,
    /// Sessions in baseline but not current.
    pub removed_sessions: Vec<i64>,
}

/// A session whose total moved between two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalChange {
    pub session_id: i64,
    pub baseline: Option<f64>,
    pub current: Option<f64>,
    /// `None` when either side has no total.
    pub delta: Option<f64>,
}

impl ComparisonReport {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} changed, {} unchanged, {} new, {} removed\n\n",
            self.changes.len(),
            self.unchanged,
            self.new_sessions.len(),
            self.removed_sessions.len()
        ));

        if !self.changes.is_empty() {
            md.push_str("### Changed totals\n\n");
            md.push_str("| Session | Baseline | Current | Delta |\n");
            md.push_str("|---------|----------|---------|-------|\n");
            for c in &self.changes {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    c.session_id,
                    fmt_total(c.baseline),
                    fmt_total(c.current),
                    c.delta.map(|d| format!("{d:+.2}")).unwrap_or_else(|| "-".into()),
                ));
            }
            md.push('\n');
        }

        if !self.new_sessions.is_empty() {
            md.push_str(&format!("New sessions: {}\n", join_ids(&self.new_sessions)));
        }
        if !self.removed_sessions.is_empty() {
            md.push_str(&format!("Removed sessions: {}\n", join_ids(&self.removed_sessions)));
        }

        md
    }

    /// Returns true if any session total changed.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

fn fmt_total(total: Option<f64>) -> String {
    total.map(|t| format!("{t:.2}")).unwrap_or_else(|| "n/a".into())
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakdown::{Aggregation, AnswerOutcome, BreakdownEntry};
    use crate::model::RespondentCategory;
    use crate::statistics::compute_batch_stats;

    fn breakdown(session_id: i64, value: f64) -> ResultBreakdown {
        ResultBreakdown::fold(
            session_id,
            RespondentCategory::Adult,
            Aggregation::Sum,
            vec![BreakdownEntry {
                key: AnswerKey {
                    question_id: 1,
                    possible_answer_id: 1,
                },
                question: "Q1".into(),
                formula: value.to_string(),
                outcome: AnswerOutcome::Scored { value },
            }],
        )
    }

    fn make_report(breakdowns: Vec<ResultBreakdown>, failures: Vec<SessionFailure>) -> BatchReport {
        let stats = compute_batch_stats(&breakdowns, failures.len());
        BatchReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            calculator: CalculatorConfig::default(),
            breakdowns,
            failures,
            stats,
            duration_ms: 0,
        }
    }

    fn failure(session_id: i64) -> SessionFailure {
        SessionFailure {
            session_id,
            answer: None,
            message: "division by zero".into(),
        }
    }

    #[test]
    fn save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let report = make_report(vec![breakdown(1, 27.0)], vec![failure(2)]);

        report.save_json(&path).unwrap();
        let loaded = BatchReport::load_json(&path).unwrap();

        assert_eq!(loaded.breakdowns, report.breakdowns);
        assert_eq!(loaded.failures, report.failures);
        assert_eq!(loaded.stats, report.stats);
        assert_eq!(loaded.breakdown(1).and_then(|b| b.total()), Some(27.0));
    }

    #[test]
    fn identical_reports_have_no_changes() {
        let baseline = make_report(vec![breakdown(1, 10.0), breakdown(2, 20.0)], vec![]);
        let current = make_report(vec![breakdown(1, 10.0), breakdown(2, 20.0)], vec![]);
        let cmp = current.compare(&baseline, 0.0);
        assert!(!cmp.has_changes());
        assert_eq!(cmp.unchanged, 2);
    }

    #[test]
    fn detects_changed_totals() {
        let baseline = make_report(vec![breakdown(1, 10.0), breakdown(2, 20.0)], vec![]);
        let current = make_report(vec![breakdown(1, 12.5), breakdown(2, 20.001)], vec![]);
        let cmp = current.compare(&baseline, 0.01);
        assert_eq!(cmp.changes.len(), 1);
        assert_eq!(cmp.changes[0].session_id, 1);
        assert_eq!(cmp.changes[0].delta, Some(2.5));
        assert_eq!(cmp.unchanged, 1);
    }

    #[test]
    fn failure_transition_is_a_change() {
        let baseline = make_report(vec![breakdown(1, 10.0)], vec![]);
        let current = make_report(vec![], vec![failure(1)]);
        let cmp = current.compare(&baseline, 0.0);
        assert_eq!(cmp.changes.len(), 1);
        assert_eq!(cmp.changes[0].current, None);
        assert_eq!(cmp.changes[0].delta, None);
    }

    #[test]
    fn new_and_removed_sessions() {
        let baseline = make_report(vec![breakdown(1, 1.0), breakdown(2, 2.0)], vec![]);
        let current = make_report(vec![breakdown(2, 2.0), breakdown(3, 3.0)], vec![]);
        let cmp = current.compare(&baseline, 0.0);
        assert_eq!(cmp.new_sessions, vec![3]);
        assert_eq!(cmp.removed_sessions, vec![1]);
        assert_eq!(cmp.unchanged, 1);
    }

    #[test]
    fn markdown_lists_changes() {
        let baseline = make_report(vec![breakdown(1, 10.0)], vec![]);
        let current = make_report(vec![breakdown(1, 15.0), breakdown(4, 1.0)], vec![]);
        let md = current.compare(&baseline, 0.0).to_markdown();
        assert!(md.contains("1 changed"));
        assert!(md.contains("| 1 | 10.00 | 15.00 | +5.00 |"));
        assert!(md.contains("New sessions: 4"));
    }
}
