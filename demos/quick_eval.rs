//! Quick eval example: minimal programmatic usage of scorecalc.
//!
//! Evaluates a single formula, then scores every session of a file.
//!
//! ```bash
//! cargo run -p scorecalc-core --example quick_eval
//! cargo run -p scorecalc-core --example quick_eval -- sessions/weekly.toml
//! ```

use std::env;

use scorecalc_core::calculator::Calculator;
use scorecalc_core::formula::{self, Bindings};
use scorecalc_core::parser;

fn main() -> anyhow::Result<()> {
    // One formula, bound by hand
    let mut bindings = Bindings::new();
    bindings.insert("distance".to_string(), "100".to_string());
    bindings.insert("factor".to_string(), "2.5".to_string());
    let value = formula::evaluate("distance * factor + round(0.5)", &bindings)?;
    println!("distance * factor + round(0.5) = {value}");

    // A whole session file, scored with the default calculator
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "sessions/sample.json".to_string());
    let sessions = parser::parse_sessions(path.as_ref())?;
    println!("\nLoaded {} session(s) from {path}\n", sessions.len());

    let calculator = Calculator::default();
    for session in &sessions {
        match calculator.calculate(session) {
            Ok(breakdown) => {
                println!("session {} ({}):", session.id, breakdown.respondent());
                for entry in breakdown.entries() {
                    let value = entry
                        .outcome
                        .value()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "failed".into());
                    println!("  [{}] {} = {value}", entry.key, entry.formula);
                }
                match breakdown.total() {
                    Some(total) => println!("  total: {total}"),
                    None => println!("  total: n/a"),
                }
            }
            Err(e) => println!("session {}: {e}", session.id),
        }
    }

    Ok(())
}
