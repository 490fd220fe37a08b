//! scorecalc CLI: score quiz sessions from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use scorecalc_core::breakdown::Aggregation;
use scorecalc_core::config::FailurePolicy;

mod commands;

#[derive(Parser)]
#[command(name = "scorecalc", version, about = "Quiz session formula scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single formula
    Eval {
        /// The formula, e.g. "distance * factor + 1"
        #[arg(allow_hyphen_values = true)]
        formula: String,

        /// Variable binding as NAME=VALUE (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Also print the postfix form
        #[arg(long)]
        postfix: bool,
    },

    /// Score sessions and write reports
    Score {
        /// Path to a session file (.json/.toml) or directory
        #[arg(long)]
        sessions: PathBuf,

        /// Output directory (default: output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Also write a signed copy of the JSON report
        #[arg(long)]
        sign: bool,

        /// What to do when an answer fails: abort, record
        #[arg(long)]
        failure_policy: Option<FailurePolicy>,

        /// How answer values combine: sum, mean, min, max
        #[arg(long)]
        aggregation: Option<Aggregation>,

        /// Max sessions scored concurrently
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate session files
    Validate {
        /// Path to a session file or directory
        #[arg(long)]
        sessions: PathBuf,
    },

    /// Compare two batch reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Minimum absolute change in a session total to report
        #[arg(long, default_value = "0.0")]
        threshold: f64,

        /// Exit code 1 if any total changed
        #[arg(long)]
        fail_on_change: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Verify a signed result envelope
    Verify {
        /// Signed envelope JSON
        #[arg(long)]
        envelope: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example session
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scorecalc=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            formula,
            vars,
            postfix,
        } => commands::eval::execute(formula, vars, postfix),
        Commands::Score {
            sessions,
            output,
            format,
            sign,
            failure_policy,
            aggregation,
            parallelism,
            config,
        } => {
            commands::score::execute(
                sessions,
                output,
                format,
                sign,
                failure_policy,
                aggregation,
                parallelism,
                config,
            )
            .await
        }
        Commands::Validate { sessions } => commands::validate::execute(sessions),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_change,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_change, format),
        Commands::Verify { envelope, config } => commands::verify::execute(envelope, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
