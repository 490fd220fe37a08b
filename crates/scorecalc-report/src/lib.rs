//! scorecalc-report: Human-readable renderings of batch reports.

pub mod html;

pub use html::{generate_html, write_html_report};
