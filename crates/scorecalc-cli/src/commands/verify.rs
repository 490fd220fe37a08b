//! The `scorecalc verify` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use scorecalc_core::config::load_config_from;
use scorecalc_core::report::BatchReport;
use scorecalc_signing::{ResultSigner, SignedEnvelope, SigningKey};

pub fn execute(envelope_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let signer = ResultSigner::new(SigningKey::from_config(config.signing_key.as_deref())?);

    let content = std::fs::read_to_string(&envelope_path)
        .with_context(|| format!("failed to read envelope from {}", envelope_path.display()))?;
    let envelope = SignedEnvelope::from_json(&content)
        .with_context(|| format!("failed to parse envelope {}", envelope_path.display()))?;

    signer
        .verify(&envelope)
        .with_context(|| format!("verification failed for {}", envelope_path.display()))?;

    println!("Signature OK ({})", envelope.algorithm);
    if let Ok(report) = serde_json::from_value::<BatchReport>(envelope.payload) {
        println!(
            "Batch report {}: {} scored, {} failed",
            report.id,
            report.breakdowns.len(),
            report.failures.len()
        );
    }

    Ok(())
}
