//! Annealing configuration and temperature schedule.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::perturb::Perturbation;

/// Configuration for an annealing run.
///
/// The temperature follows `T(t) = initial_temperature * exp(-t / time_constant)`
/// where `t` counts completed temperature steps. One step lasts
/// `steps_per_temperature` evaluated candidates. The run stops once
/// `max_iterations` candidates were evaluated or `T <= final_temperature`.
///
/// # Examples
///
/// ```
/// use u_embed::anneal::AnnealConfig;
/// use u_embed::perturb::Perturbation;
///
/// let config = AnnealConfig::default()
///     .with_initial_temperature(10.0)
///     .with_time_constant(25.0)
///     .with_steps_per_temperature(10)
///     .with_final_temperature(0.1)
///     .with_max_iterations(2000)
///     .with_perturbation(Perturbation::Chain(2))
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnnealConfig {
    /// Starting temperature. Higher values accept more worsening moves early.
    pub initial_temperature: f64,

    /// Decay constant of the exponential schedule, in temperature steps.
    pub time_constant: f64,

    /// Evaluated candidates per temperature step.
    pub steps_per_temperature: usize,

    /// The run stops when the temperature reaches this value.
    pub final_temperature: f64,

    /// Hard budget of evaluated candidates.
    pub max_iterations: usize,

    /// Candidate proposal scheme.
    pub perturbation: Perturbation,

    /// Back-to-back transient evaluation failures tolerated before the run
    /// gives up. `None` means `max_iterations`.
    pub max_consecutive_failures: Option<usize>,

    /// Random seed for reproducibility. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 10.0,
            time_constant: 25.0,
            steps_per_temperature: 10,
            final_temperature: 0.1,
            max_iterations: 2000,
            perturbation: Perturbation::Single,
            max_consecutive_failures: None,
            seed: None,
        }
    }
}

impl AnnealConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_time_constant(mut self, tau: f64) -> Self {
        self.time_constant = tau;
        self
    }

    pub fn with_steps_per_temperature(mut self, n: usize) -> Self {
        self.steps_per_temperature = n;
        self
    }

    pub fn with_final_temperature(mut self, t: f64) -> Self {
        self.final_temperature = t;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_perturbation(mut self, perturbation: Perturbation) -> Self {
        self.perturbation = perturbation;
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
        for (name, value) in [
            ("initial_temperature", self.initial_temperature),
            ("final_temperature", self.final_temperature),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NonPositiveTemperature { name, value });
            }
        }
        if self.final_temperature >= self.initial_temperature {
            return Err(ConfigError::FinalNotBelowInitial {
                initial_temperature: self.initial_temperature,
                final_temperature: self.final_temperature,
            });
        }
        if !(self.time_constant > 0.0 && self.time_constant.is_finite()) {
            return Err(ConfigError::NonPositiveTimeConstant(self.time_constant));
        }
        if self.steps_per_temperature == 0 {
            return Err(ConfigError::ZeroStepsPerTemperature);
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroMaxIterations);
        }
        if self.max_consecutive_failures == Some(0) {
            return Err(ConfigError::ZeroFailureBudget);
        }
        self.perturbation.validate()
    }

    /// Temperature after `step` completed temperature steps.
    pub fn temperature_at(&self, step: usize) -> f64 {
        self.initial_temperature * (-(step as f64) / self.time_constant).exp()
    }

    /// Effective failure budget.
    pub fn failure_budget(&self) -> usize {
        self.max_consecutive_failures.unwrap_or(self.max_iterations)
    }

    /// Reports a schedule that cannot reach `final_temperature` within
    /// `max_iterations`. The run still proceeds; it will stop on the
    /// iteration budget instead.
    pub fn schedule_warning(&self) -> Option<ScheduleWarning> {
        let steps = self.max_iterations as f64 / self.steps_per_temperature as f64;
        let reached = self.initial_temperature * (-steps / self.time_constant).exp();
        (reached > self.final_temperature).then_some(ScheduleWarning {
            temperature_at_budget: reached,
            final_temperature: self.final_temperature,
        })
    }
}

/// Non-fatal diagnostic: the iteration budget runs out before the
/// schedule reaches its final temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduleWarning {
    /// Temperature the schedule would reach after `max_iterations`.
    pub temperature_at_budget: f64,
    /// Configured final temperature.
    pub final_temperature: f64,
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "final temperature {} not reached even at maximum iteration (schedule ends at {:.4})",
            self.final_temperature, self.temperature_at_budget
        )
    }
}
