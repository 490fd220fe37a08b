//! Configuration loading.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::breakdown::Aggregation;

/// What the calculator does when one answer's formula fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// The first failing answer fails the whole session.
    #[default]
    Abort,
    /// The failure is recorded on the answer; the session total is withheld.
    Record,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Record => write!(f, "record"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "record" => Ok(FailurePolicy::Record),
            other => Err(format!("unknown failure policy: {other}")),
        }
    }
}

/// Settings for one [`Calculator`](crate::calculator::Calculator).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalculatorConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub aggregation: Aggregation,
}

/// Top-level scorecalc configuration.
///
/// Note: Custom Debug impl masks the signing key to keep it out of logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ScorecalcConfig {
    #[serde(default)]
    pub calculator: CalculatorConfig,
    /// Max sessions scored concurrently in a batch.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Key used to sign results. May reference env vars as `${NAME}`.
    #[serde(default)]
    pub signing_key: Option<String>,
}

impl fmt::Debug for ScorecalcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScorecalcConfig")
            .field("calculator", &self.calculator)
            .field("parallelism", &self.parallelism)
            .field("output_dir", &self.output_dir)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "***"))
            .finish()
    }
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./scorecalc-results")
}

impl Default for ScorecalcConfig {
    fn default() -> Self {
        Self {
            calculator: CalculatorConfig::default(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            signing_key: None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `scorecalc.toml` in the current directory
/// 2. `~/.config/scorecalc/config.toml`
///
/// Environment variable overrides: `SCORECALC_SIGNING_KEY`, `SCORECALC_FAILURE_POLICY`.
pub fn load_config() -> Result<ScorecalcConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ScorecalcConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("scorecalc.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ScorecalcConfig::default(),
    };

    if let Ok(key) = std::env::var("SCORECALC_SIGNING_KEY") {
        config.signing_key = Some(key);
    }

    if let Ok(policy) = std::env::var("SCORECALC_FAILURE_POLICY") {
        config.calculator.failure_policy = policy
            .parse()
            .map_err(|e: String| anyhow::anyhow!("SCORECALC_FAILURE_POLICY: {e}"))?;
    }

    config.signing_key = config
        .signing_key
        .as_deref()
        .map(resolve_env_vars)
        .filter(|k| !k.is_empty());

    Ok(config)
}

/// Parse a TOML config document (useful for testing).
pub fn parse_config_str(content: &str) -> Result<ScorecalcConfig> {
    let config: ScorecalcConfig = toml::from_str(content)?;
    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("scorecalc"))
}
