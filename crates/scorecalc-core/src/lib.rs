//! scorecalc-core: Formula engine, session model, and scoring.
//!
//! This crate defines the session data model, the arithmetic formula
//! pipeline, and the calculator that turns a session into a
//! [`ResultBreakdown`](breakdown::ResultBreakdown). Batch scoring, reports,
//! and statistics build on top of it.

pub mod breakdown;
pub mod calculator;
pub mod config;
pub mod engine;
pub mod error;
pub mod formula;
pub mod model;
pub mod parser;
pub mod report;
pub mod statistics;
