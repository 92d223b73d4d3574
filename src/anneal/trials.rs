//! Independent repeated runs.
//!
//! Each trial owns its state, random source and objective; only the
//! connectivity graph is shared (read-only). With the `parallel` feature
//! trials run on the rayon thread pool.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::config::AnnealConfig;
use super::runner::{AnnealResult, AnnealRunner};
use crate::error::Result;
use crate::graph::ConnectivityGraph;
use crate::objective::Objective;

/// Runs `trials` independent searches for `size`-qubit embeddings, each from
/// its own random connected start.
///
/// Trial `i` uses seed `config.seed + i` when a seed is configured, so the
/// whole batch is reproducible. `make_objective(i)` builds trial `i`'s
/// objective.
///
/// # Errors
///
/// The first error of any trial.
pub fn run_trials<O, F>(
    graph: &ConnectivityGraph,
    config: &AnnealConfig,
    size: usize,
    trials: usize,
    make_objective: F,
) -> Result<Vec<AnnealResult>>
where
    O: Objective + Send,
    F: Fn(usize) -> O + Sync,
{
    let run_one = |trial: usize| -> Result<AnnealResult> {
        let mut trial_config = config.clone();
        trial_config.seed = config.seed.map(|s| s.wrapping_add(trial as u64));
        AnnealRunner::run_random_start(graph, &trial_config, size, make_objective(trial))
    };

    #[cfg(feature = "parallel")]
    let results: Result<Vec<_>> = (0..trials).into_par_iter().map(run_one).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Result<Vec<_>> = (0..trials).map(run_one).collect();
    results
}

/// A search result that reports its best cost after every evaluation.
pub trait CostTrace {
    /// Running best cost, one value per point of the search.
    fn best_cost_trace(&self) -> Vec<f64>;
}

impl CostTrace for AnnealResult {
    fn best_cost_trace(&self) -> Vec<f64> {
        AnnealResult::best_cost_trace(self)
    }
}

/// Pointwise mean of [`CostTrace::best_cost_trace`] over the common prefix
/// of all traces. Empty when `results` is empty.
pub fn mean_best_trace<T: CostTrace>(results: &[T]) -> Vec<f64> {
    let traces: Vec<Vec<f64>> = results.iter().map(CostTrace::best_cost_trace).collect();
    let Some(len) = traces.iter().map(Vec::len).min() else {
        return Vec::new();
    };
    (0..len)
        .map(|i| traces.iter().map(|t| t[i]).sum::<f64>() / traces.len() as f64)
        .collect()
}
