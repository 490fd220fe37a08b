//! The `scorecalc validate` command.

use std::path::PathBuf;

use anyhow::Result;

use scorecalc_core::parser;

pub fn execute(sessions_path: PathBuf) -> Result<()> {
    let sessions = parser::load_sessions(&sessions_path)?;
    println!("Loaded {} session(s)", sessions.len());

    let mut total_warnings = 0;

    for session in &sessions {
        let warnings = parser::validate_session(session);
        if warnings.is_empty() {
            continue;
        }
        println!("Session {} ({} answers)", session.id, session.answers.len());
        for w in &warnings {
            let prefix = w
                .answer_index
                .and_then(|i| session.answers.get(i))
                .map(|a| format!("  [{}]", a.key()))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All sessions valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
