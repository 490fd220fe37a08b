//! Session scoring.
//!
//! The [`Calculator`] runs the formula pipeline once per answer and folds the
//! outcomes into a [`ResultBreakdown`].

use crate::breakdown::{AnswerOutcome, BreakdownEntry, ResultBreakdown};
use crate::config::{CalculatorConfig, FailurePolicy};
use crate::error::{CalculationError, FormulaError};
use crate::formula;
use crate::model::{Answer, Session};

/// Scores sessions according to a [`CalculatorConfig`].
#[derive(Debug, Clone, Default)]
pub struct Calculator {
    config: CalculatorConfig,
}

impl Calculator {
    pub fn new(config: CalculatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Evaluate one answer's formula with the answer's own variable values.
    pub fn evaluate_answer(&self, answer: &Answer) -> Result<f64, FormulaError> {
        let bindings = answer.bindings()?;
        formula::evaluate(answer.formula(), &bindings)
    }

    /// Score every answer of a session, in order.
    ///
    /// With [`FailurePolicy::Abort`] the first failing answer is returned as
    /// the error. With [`FailurePolicy::Record`] the failure is kept on the
    /// answer's entry and the breakdown's total is withheld.
    pub fn calculate(&self, session: &Session) -> Result<ResultBreakdown, CalculationError> {
        let mut entries = Vec::with_capacity(session.answers.len());

        for answer in &session.answers {
            let key = answer.key();
            let result = self.evaluate_answer(answer);

            match &result {
                Ok(value) => {
                    tracing::debug!(session = session.id, answer = %key, value, "answer scored");
                }
                Err(e) => match self.config.failure_policy {
                    FailurePolicy::Abort => {
                        tracing::debug!(
                            session = session.id,
                            answer = %key,
                            "answer failed, aborting: {e}"
                        );
                        return Err(CalculationError::Answer {
                            key,
                            source: e.clone(),
                        });
                    }
                    FailurePolicy::Record => {
                        tracing::warn!(session = session.id, answer = %key, "answer failed: {e}");
                    }
                },
            }

            entries.push(BreakdownEntry {
                key,
                question: answer.possible_answer.question.name.clone(),
                formula: answer.formula().to_string(),
                outcome: AnswerOutcome::from(result),
            });
        }

        let breakdown = ResultBreakdown::fold(
            session.id,
            session.category(),
            self.config.aggregation,
            entries,
        );

        if breakdown.overflowed() {
            match self.config.failure_policy {
                FailurePolicy::Abort => {
                    return Err(CalculationError::Total {
                        session_id: session.id,
                        source: FormulaError::NonFinite(self.config.aggregation.to_string()),
                    });
                }
                FailurePolicy::Record => {
                    tracing::warn!(session = session.id, "session total is not finite, withheld");
                }
            }
        }

        Ok(breakdown)
    }
}
