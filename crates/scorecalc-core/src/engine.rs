//! Batch scoring engine.
//!
//! Scores many sessions concurrently and collects the outcome into a
//! [`BatchReport`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::breakdown::ResultBreakdown;
use crate::calculator::Calculator;
use crate::error::CalculationError;
use crate::model::Session;
use crate::report::{BatchReport, SessionFailure};
use crate::statistics::compute_batch_stats;

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_session_complete(&self, breakdown: &ResultBreakdown);
    fn on_session_error(&self, session_id: i64, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_session_complete(&self, _: &ResultBreakdown) {}
    fn on_session_error(&self, _: i64, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Scores a batch of sessions with bounded parallelism.
pub struct BatchEngine {
    calculator: Arc<Calculator>,
    parallelism: usize,
}

impl BatchEngine {
    pub fn new(calculator: Calculator, parallelism: usize) -> Self {
        Self {
            calculator: Arc::new(calculator),
            parallelism: parallelism.max(1),
        }
    }

    /// Score every session. Per-session failures land in the report rather
    /// than failing the batch.
    pub async fn run(
        &self,
        sessions: Vec<Session>,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut futures = FuturesUnordered::new();

        for session in sessions {
            let calculator = Arc::clone(&self.calculator);
            let semaphore = Arc::clone(&semaphore);

            futures.push(async move {
                let session_id = session.id;
                let inner = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    let outcome =
                        tokio::task::spawn_blocking(move || calculator.calculate(&session))
                            .await?;
                    Ok::<_, anyhow::Error>(outcome)
                };
                (session_id, inner.await)
            });
        }

        let total = futures.len();
        let mut breakdowns = Vec::new();
        let mut failures = Vec::new();

        while let Some((session_id, result)) = futures.next().await {
            match result {
                Ok(Ok(breakdown)) => {
                    progress.on_session_complete(&breakdown);
                    breakdowns.push(breakdown);
                }
                Ok(Err(CalculationError::Answer { key, source })) => {
                    tracing::error!("session {session_id} failed at answer {key}: {source}");
                    let message = source.to_string();
                    progress.on_session_error(session_id, &message);
                    failures.push(SessionFailure {
                        session_id,
                        answer: Some(key),
                        message,
                    });
                }
                Ok(Err(e @ CalculationError::Total { .. })) => {
                    tracing::error!("{e}");
                    let message = e.to_string();
                    progress.on_session_error(session_id, &message);
                    failures.push(SessionFailure {
                        session_id,
                        answer: None,
                        message,
                    });
                }
                Err(e) => {
                    tracing::error!("session {session_id} failed: {e:#}");
                    let message = format!("{e:#}");
                    progress.on_session_error(session_id, &message);
                    failures.push(SessionFailure {
                        session_id,
                        answer: None,
                        message,
                    });
                }
            }
        }

        breakdowns.sort_by_key(|b| b.session_id());
        failures.sort_by_key(|f| f.session_id);

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, breakdowns.len(), failures.len(), elapsed);

        let stats = compute_batch_stats(&breakdowns, failures.len());

        Ok(BatchReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            calculator: *self.calculator.config(),
            breakdowns,
            failures,
            stats,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}
