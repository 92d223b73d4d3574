//! Random-restart search configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Keep probabilities at or below this are treated as zero.
const KEEP_FLOOR: f64 = 1e-9;

/// Configuration for a random-restart search.
///
/// The search scores `samples` random embeddings, then refines the best one
/// with partial shuffles. The keep probability starts at
/// `initial_keep_probability` and drops by `keep_probability_step` before
/// each refinement, so later refinements move more slots. Refinement ends
/// when the keep probability reaches zero.
///
/// # Examples
///
/// ```
/// use u_embed::restart::RestartConfig;
///
/// let config = RestartConfig::default();
/// let schedule = config.keep_schedule();
/// assert_eq!(schedule.len(), 19);
/// assert!((schedule[0] - 0.95).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RestartConfig {
    /// Random embeddings to score before refining.
    pub samples: usize,

    /// Keep probability the refinement schedule starts from, in `[0, 1]`.
    pub initial_keep_probability: f64,

    /// Decrease of the keep probability per refinement.
    pub keep_probability_step: f64,

    /// Back-to-back transient evaluation failures tolerated before the
    /// search gives up. `None` means `samples` plus the refinement count.
    pub max_consecutive_failures: Option<usize>,

    /// Random seed for reproducibility. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            samples: 11,
            initial_keep_probability: 1.0,
            keep_probability_step: 0.05,
            max_consecutive_failures: None,
            seed: None,
        }
    }
}

impl RestartConfig {
    pub fn with_samples(mut self, n: usize) -> Self {
        self.samples = n;
        self
    }

    pub fn with_initial_keep_probability(mut self, p: f64) -> Self {
        self.initial_keep_probability = p;
        self
    }

    pub fn with_keep_probability_step(mut self, step: f64) -> Self {
        self.keep_probability_step = step;
        self
    }

    pub fn with_max_consecutive_failures(mut self, n: usize) -> Self {
        self.max_consecutive_failures = Some(n);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if !(0.0..=1.0).contains(&self.initial_keep_probability) {
            return Err(ConfigError::InvalidKeepProbability(
                self.initial_keep_probability,
            ));
        }
        if !(self.keep_probability_step.is_finite() && self.keep_probability_step > 0.0) {
            return Err(ConfigError::InvalidKeepStep(self.keep_probability_step));
        }
        if self.max_consecutive_failures == Some(0) {
            return Err(ConfigError::ZeroFailureBudget);
        }
        Ok(())
    }

    /// Keep probabilities of the refinement steps, in order.
    ///
    /// Empty when the step is not a positive finite number.
    pub fn keep_schedule(&self) -> Vec<f64> {
        if !(self.keep_probability_step.is_finite() && self.keep_probability_step > 0.0) {
            return Vec::new();
        }
        (1..)
            .map(|k| self.initial_keep_probability - k as f64 * self.keep_probability_step)
            .take_while(|&p| p > KEEP_FLOOR)
            .collect()
    }

    /// Effective consecutive-failure budget.
    pub fn failure_budget(&self) -> usize {
        self.max_consecutive_failures
            .unwrap_or_else(|| self.samples + self.keep_schedule().len())
    }
}
