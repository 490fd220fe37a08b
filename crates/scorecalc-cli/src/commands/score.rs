//! The `scorecalc score` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use scorecalc_core::breakdown::{Aggregation, ResultBreakdown};
use scorecalc_core::calculator::Calculator;
use scorecalc_core::config::{load_config_from, FailurePolicy};
use scorecalc_core::engine::{BatchEngine, ProgressReporter};
use scorecalc_core::parser;
use scorecalc_core::report::BatchReport;
use scorecalc_report::html::write_html_report;
use scorecalc_signing::{ResultSigner, SigningKey};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_session_complete(&self, breakdown: &ResultBreakdown) {
        let total = match breakdown.total() {
            Some(t) => format!("{t}"),
            None if breakdown.overflowed() => "n/a (overflow)".to_string(),
            None => format!("n/a ({} failed)", breakdown.failed()),
        };
        eprintln!("  Done: session {} total {total}", breakdown.session_id());
    }

    fn on_session_error(&self, session_id: i64, error: &str) {
        eprintln!("  ERROR: session {session_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} scored, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    sessions_path: PathBuf,
    output: Option<PathBuf>,
    format: String,
    sign: bool,
    failure_policy: Option<FailurePolicy>,
    aggregation: Option<Aggregation>,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;

    if let Some(policy) = failure_policy {
        config.calculator.failure_policy = policy;
    }
    if let Some(aggregation) = aggregation {
        config.calculator.aggregation = aggregation;
    }
    if let Some(parallelism) = parallelism {
        anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
        config.parallelism = parallelism;
    }
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    // A missing key fails before any session is scored.
    let signer = if sign {
        let key = SigningKey::from_config(config.signing_key.as_deref())?;
        Some(ResultSigner::new(key))
    } else {
        None
    };

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };
    if let Some(unknown) = formats.iter().find(|f| !matches!(**f, "json" | "html")) {
        anyhow::bail!("unknown format: {unknown} (expected json, html, or all)");
    }

    let sessions = parser::load_sessions(&sessions_path)?;
    anyhow::ensure!(
        !sessions.is_empty(),
        "no sessions found in {}",
        sessions_path.display()
    );
    tracing::info!(?config, "loaded configuration");

    eprintln!(
        "scorecalc v{}: scoring {} sessions (policy: {}, aggregation: {})",
        env!("CARGO_PKG_VERSION"),
        sessions.len(),
        config.calculator.failure_policy,
        config.calculator.aggregation
    );
    eprintln!();

    let engine = BatchEngine::new(Calculator::new(config.calculator), config.parallelism);
    let report = engine.run(sessions, &ConsoleReporter).await?;

    print_summary(&report);

    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("report-{timestamp}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {}
        }
    }

    if let Some(signer) = signer {
        let envelope = signer.sign(&report)?;
        let path = output.join(format!("report-{timestamp}.signed.json"));
        std::fs::write(&path, envelope.to_json_pretty()?)
            .with_context(|| format!("failed to write signed report to {}", path.display()))?;
        eprintln!("Signed report: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Session", "Respondent", "Total", "Answers", "Failed"]);

    for b in &report.breakdowns {
        table.add_row(vec![
            Cell::new(b.session_id()),
            Cell::new(b.respondent()),
            Cell::new(
                match (b.total(), b.partial_total()) {
                    (Some(t), _) => format!("{t}"),
                    (None, Some(p)) => format!("n/a (partial {p})"),
                    (None, None) => "n/a (overflow)".to_string(),
                },
            ),
            Cell::new(b.entries().len()),
            Cell::new(b.failed()),
        ]);
    }
    for f in &report.failures {
        table.add_row(vec![
            Cell::new(f.session_id),
            Cell::new("-"),
            Cell::new("aborted"),
            Cell::new("-"),
            Cell::new(
                f.answer
                    .map(|k| format!("{k}: {}", f.message))
                    .unwrap_or_else(|| f.message.clone()),
            ),
        ]);
    }

    println!("{table}");

    if let Some(totals) = &report.stats.totals {
        println!(
            "Totals: mean {:.2}, min {}, max {}",
            totals.mean, totals.min, totals.max
        );
    }
}
