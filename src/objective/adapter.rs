//! Failure normalization around an external objective.

use tracing::debug;

use super::types::Objective;
use crate::embedding::Embedding;
use crate::error::ObjectiveError;

/// Wraps an [`Objective`] and normalizes its failures.
///
/// Non-finite costs are reported as transient failures, since the
/// acceptance rule cannot compare them. Evaluation and failure counts are
/// kept for the run report.
#[derive(Debug)]
pub struct ObjectiveAdapter<O> {
    inner: O,
    evaluations: usize,
    transient_failures: usize,
}

impl<O: Objective> ObjectiveAdapter<O> {
    /// Wraps `inner`.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            evaluations: 0,
            transient_failures: 0,
        }
    }

    /// Scores `embedding`.
    ///
    /// Returns `Err(ObjectiveError::Transient)` for recoverable failures and
    /// passes fatal failures through unchanged.
    pub fn evaluate(&mut self, embedding: &Embedding) -> Result<f64, ObjectiveError> {
        self.evaluations += 1;
        let outcome = match self.inner.evaluate(embedding) {
            Ok(cost) if cost.is_finite() => Ok(cost),
            Ok(cost) => Err(ObjectiveError::Transient(format!(
                "objective returned non-finite cost {cost}"
            ))),
            Err(e) => Err(e),
        };
        if let Err(ObjectiveError::Transient(reason)) = &outcome {
            self.transient_failures += 1;
            debug!(embedding = %embedding, %reason, "evaluation discarded");
        }
        outcome
    }

    /// Calls made so far, successful or not.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Transient failures so far.
    pub fn transient_failures(&self) -> usize {
        self.transient_failures
    }

    /// Returns the wrapped objective.
    pub fn into_inner(self) -> O {
        self.inner
    }
}
