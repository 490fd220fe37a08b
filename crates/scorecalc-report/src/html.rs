//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use scorecalc_core::breakdown::{AnswerOutcome, ResultBreakdown};
use scorecalc_core::report::BatchReport;
use scorecalc_core::statistics::QuestionStats;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn fmt_total(total: Option<f64>) -> String {
    total.map(|t| format!("{t:.2}")).unwrap_or_else(|| "n/a".into())
}

/// Generate an HTML report from a batch report.
pub fn generate_html(report: &BatchReport) -> String {
    let mut html = String::new();
    let stats = &report.stats;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>scorecalc report {}</title>\n", report.id));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>scorecalc report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} sessions | aggregation: <strong>{}</strong> | failure policy: <strong>{}</strong> | {} | {}ms</p>\n",
        stats.sessions,
        report.calculator.aggregation,
        report.calculator.failure_policy,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.duration_ms,
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Complete</th><th>Partial</th><th>Failed</th><th>Mean total</th><th>Min</th><th>Max</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    let (mean, min, max) = match &stats.totals {
        Some(t) => (Some(t.mean), Some(t.min), Some(t.max)),
        None => (None, None, None),
    };
    html.push_str(&format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        stats.complete,
        stats.partial,
        stats.failed,
        fmt_total(mean),
        fmt_total(min),
        fmt_total(max),
    ));
    html.push_str("</tbody></table>\n");

    if !stats.per_category.is_empty() {
        html.push_str("<table class=\"categories\">\n");
        html.push_str("<thead><tr><th>Respondent</th><th>Sessions</th><th>Mean total</th></tr></thead>\n<tbody>\n");
        for (category, c) in &stats.per_category {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{:.2}</td></tr>\n",
                category, c.sessions, c.mean_total
            ));
        }
        html.push_str("</tbody></table>\n");
    }

    // SVG bar chart of per-question means
    if !stats.per_question.is_empty() {
        html.push_str("<h3>Mean score per question</h3>\n");
        html.push_str(&generate_bar_chart(&stats.per_question));
    }

    html.push_str("</section>\n");

    // Per-session results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Sessions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Session</th><th onclick=\"sortTable(1)\">Respondent</th><th onclick=\"sortTable(2)\">Total</th><th onclick=\"sortTable(3)\">Answers</th><th onclick=\"sortTable(4)\">Failed</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for b in &report.breakdowns {
        let class = if b.is_complete() { "pass" } else { "fail" };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            b.session_id(),
            b.respondent(),
            fmt_total(b.total()),
            b.entries().len(),
            b.failed()
        ));
    }
    for f in &report.failures {
        html.push_str(&format!(
            "<tr class=\"fail\"><td>{}</td><td>-</td><td>aborted</td><td>-</td><td>{}</td></tr>\n",
            f.session_id,
            html_escape(&f.message)
        ));
    }

    html.push_str("</tbody></table>\n");

    for b in &report.breakdowns {
        html.push_str(&session_details(b));
    }

    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(&serde_json::to_string_pretty(report).unwrap_or_default()));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &BatchReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn session_details(b: &ResultBreakdown) -> String {
    let mut out = format!(
        "<details class=\"session\">\n<summary>Session {} ({})</summary>\n",
        b.session_id(),
        fmt_total(b.total())
    );
    out.push_str("<table>\n<thead><tr><th>Answer</th><th>Question</th><th>Formula</th><th>Value</th></tr></thead>\n<tbody>\n");
    for e in b.entries() {
        let (class, value) = match &e.outcome {
            AnswerOutcome::Scored { value } => ("pass", format!("{value}")),
            AnswerOutcome::Failed { kind, message } => {
                ("fail", format!("{kind}: {}", html_escape(message)))
            }
        };
        out.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
            class,
            e.key,
            html_escape(&e.question),
            html_escape(&e.formula),
            value
        ));
    }
    out.push_str("</tbody></table>\n</details>\n");
    out
}

fn generate_bar_chart(per_question: &BTreeMap<i64, QuestionStats>) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let peak = per_question
        .values()
        .map(|q| q.mean.abs())
        .fold(0.0f64, f64::max);

    let total_height = per_question.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 80,
        total_height
    );

    for (i, q) in per_question.values().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let ratio = if peak > 0.0 { q.mean.abs() / peak } else { 0.0 };
        let width = (ratio * max_width as f64) as usize;
        let color = if q.mean < 0.0 { "#ef4444" } else { "#3b82f6" };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&q.question)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.2}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            q.mean
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use scorecalc_core::breakdown::{Aggregation, BreakdownEntry};
    use scorecalc_core::config::CalculatorConfig;
    use scorecalc_core::error::FormulaError;
    use scorecalc_core::model::{AnswerKey, RespondentCategory};
    use scorecalc_core::report::SessionFailure;
    use scorecalc_core::statistics::compute_batch_stats;

    fn entry(id: i64, question: &str, formula: &str, outcome: AnswerOutcome) -> BreakdownEntry {
        BreakdownEntry {
            key: AnswerKey {
                question_id: id,
                possible_answer_id: id,
            },
            question: question.into(),
            formula: formula.into(),
            outcome,
        }
    }

    fn make_test_report() -> BatchReport {
        let breakdowns = vec![
            ResultBreakdown::fold(
                1,
                RespondentCategory::Adult,
                Aggregation::Sum,
                vec![
                    entry(1, "Heating", "10 + 5", AnswerOutcome::Scored { value: 15.0 }),
                    entry(2, "Travel <car>", "20 - 8", AnswerOutcome::Scored { value: 12.0 }),
                ],
            ),
            ResultBreakdown::fold(
                2,
                RespondentCategory::Kid,
                Aggregation::Sum,
                vec![entry(
                    1,
                    "Heating",
                    "x / 0",
                    AnswerOutcome::from(Err(FormulaError::DivisionByZero)),
                )],
            ),
        ];
        let failures = vec![SessionFailure {
            session_id: 3,
            answer: None,
            message: "unexpected character '&' at position 2".into(),
        }];
        let stats = compute_batch_stats(&breakdowns, failures.len());
        BatchReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            calculator: CalculatorConfig::default(),
            breakdowns,
            failures,
            stats,
            duration_ms: 42,
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&make_test_report());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("27.00"));
        assert!(html.contains("Heating"));
        assert!(html.contains("division_by_zero"));
        assert!(html.contains("aborted"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn html_escapes_user_text() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("Travel &lt;car&gt;"));
        assert!(!html.contains("Travel <car>"));
    }

    #[test]
    fn raw_json_is_escaped() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("&#x27;&amp;&#x27;"));
        assert!(!html.contains("'&'"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&report, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
