//! Simulated annealing over embeddings.
//!
//! Each step perturbs the current embedding, scores the candidate with the
//! external objective, and applies the Metropolis rule. Temperature decays
//! as `T0 * exp(-t / tau)`, with `t` advancing once per
//! `steps_per_temperature` evaluated candidates. Candidates the objective
//! cannot score are dropped without advancing any counter.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Metropolis et al. (1953), "Equation of State Calculations by Fast Computing Machines"

mod config;
mod runner;
mod state;
mod trials;

pub use config::{AnnealConfig, ScheduleWarning};
pub use runner::{AnnealResult, AnnealRunner};
pub(crate) use runner::create_rng;
pub use state::{metropolis_accept, AnnealState, HistoryEntry, Phase, StepOutcome, StopReason};
pub use trials::{mean_best_trace, run_trials, CostTrace};
