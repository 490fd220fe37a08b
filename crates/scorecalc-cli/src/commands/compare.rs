//! The `scorecalc compare` command.

use std::path::PathBuf;

use anyhow::Result;

use scorecalc_core::report::BatchReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_change: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = BatchReport::load_json(&baseline_path)?;
    let current = BatchReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} changed, {} unchanged",
                report.changes.len(),
                report.unchanged
            );

            if !report.changes.is_empty() {
                println!("\nChanged totals:");
                for c in &report.changes {
                    let show =
                        |t: Option<f64>| t.map(|v| v.to_string()).unwrap_or_else(|| "n/a".into());
                    let delta = c.delta.map(|d| format!(" ({d:+})")).unwrap_or_default();
                    println!(
                        "  session {}: {} -> {}{delta}",
                        c.session_id,
                        show(c.baseline),
                        show(c.current)
                    );
                }
            }

            if !report.new_sessions.is_empty() {
                println!("\n{} new session(s)", report.new_sessions.len());
            }
            if !report.removed_sessions.is_empty() {
                println!("{} removed session(s)", report.removed_sessions.len());
            }
        }
    }

    if fail_on_change && report.has_changes() {
        std::process::exit(1);
    }

    Ok(())
}
