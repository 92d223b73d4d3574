//! Random-restart search loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::config::RestartConfig;
use crate::anneal::CostTrace;
use crate::embedding::Embedding;
use crate::error::{AnnealError, ObjectiveError, Result, SubgraphError};
use crate::graph::ConnectivityGraph;
use crate::objective::{Objective, ObjectiveAdapter};
use crate::perturb::partial_shuffle;

/// Which part of the search produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RestartStage {
    /// Uniform random sample of the device's qubits.
    Sampling,
    /// Partial shuffle of the best embedding so far.
    Refinement {
        /// Keep probability used for the shuffle.
        keep_probability: f64,
    },
}

/// Why a random-restart search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RestartStop {
    /// Sampling and the whole refinement schedule ran.
    Completed,
    /// Too many back-to-back transient evaluation failures.
    FailureBudgetExhausted,
    /// Cancelled by the caller.
    Cancelled,
}

/// One scored candidate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RestartEntry {
    /// The candidate.
    pub embedding: Embedding,
    /// Its cost.
    pub cost: f64,
    /// Best cost after scoring it.
    pub best_cost: f64,
    /// Where the candidate came from.
    pub stage: RestartStage,
}

/// Result of a random-restart search.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RestartResult {
    /// Best embedding observed.
    pub best_embedding: Embedding,

    /// Cost of the best embedding.
    pub best_cost: f64,

    /// Random samples that were scored.
    pub samples_scored: usize,

    /// Successfully scored candidates, samples and refinements together.
    pub total_evaluations: usize,

    /// One entry per scored candidate, in order.
    pub history: Vec<RestartEntry>,

    /// Candidates discarded after a transient evaluation failure.
    pub failed_evaluations: usize,

    /// Why the search ended.
    pub stop_reason: RestartStop,
}

impl RestartResult {
    /// Best cost after each scored candidate.
    pub fn best_cost_trace(&self) -> Vec<f64> {
        self.history.iter().map(|h| h.best_cost).collect()
    }
}

impl CostTrace for RestartResult {
    fn best_cost_trace(&self) -> Vec<f64> {
        RestartResult::best_cost_trace(self)
    }
}

/// Executes the random-restart search.
///
/// Costs are minimized; to maximize a fidelity estimate, return its
/// negation from the objective.
pub struct RestartRunner;

impl RestartRunner {
    /// Searches for an embedding of `size` qubits.
    ///
    /// # Errors
    ///
    /// Invalid configuration, a `size` of zero or larger than the device,
    /// a fatal objective failure, or a failure budget that ran out before
    /// any sample could be scored.
    pub fn run<O: Objective>(
        graph: &ConnectivityGraph,
        config: &RestartConfig,
        size: usize,
        objective: O,
    ) -> Result<RestartResult> {
        Self::run_with_cancel(graph, config, size, objective, None)
    }

    /// Like [`run`](Self::run) with a cooperative cancellation flag. The
    /// flag is honored once at least one sample has been scored.
    pub fn run_with_cancel<O: Objective>(
        graph: &ConnectivityGraph,
        config: &RestartConfig,
        size: usize,
        objective: O,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<RestartResult> {
        let mut rng = crate::anneal::create_rng(config.seed);
        Self::run_with_rng(graph, config, size, objective, &mut rng, cancel.as_deref())
    }

    /// Runs with a caller-supplied random source.
    pub fn run_with_rng<O: Objective, R: Rng>(
        graph: &ConnectivityGraph,
        config: &RestartConfig,
        size: usize,
        objective: O,
        rng: &mut R,
        cancel: Option<&AtomicBool>,
    ) -> Result<RestartResult> {
        config.validate()?;
        if size == 0 {
            return Err(SubgraphError::ZeroTarget.into());
        }
        if size > graph.num_qubits() {
            return Err(AnnealError::EmbeddingSize {
                expected: size,
                got: graph.num_qubits(),
            });
        }
        let mut adapter = ObjectiveAdapter::new(objective);
        search(graph, config, size, &mut adapter, rng, cancel)
    }
}

/// Best-so-far bookkeeping shared by both stages.
struct Tracker {
    best: Option<(Embedding, f64)>,
    history: Vec<RestartEntry>,
    failed: usize,
    consecutive_failures: usize,
    budget: usize,
    stop: Option<RestartStop>,
}

impl Tracker {
    fn new(budget: usize) -> Self {
        Self {
            best: None,
            history: Vec::new(),
            failed: 0,
            consecutive_failures: 0,
            budget,
            stop: None,
        }
    }

    /// Scores `candidate`. `Ok(true)` if it was scored, `Ok(false)` if it
    /// was discarded.
    fn score<O: Objective>(
        &mut self,
        objective: &mut ObjectiveAdapter<O>,
        candidate: Embedding,
        stage: RestartStage,
    ) -> Result<bool> {
        let cost = match objective.evaluate(&candidate) {
            Ok(cost) => cost,
            Err(ObjectiveError::Transient(_)) => {
                self.failed += 1;
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.budget {
                    warn!(
                        failures = self.consecutive_failures,
                        "stopping: every recent evaluation failed"
                    );
                    self.stop = Some(RestartStop::FailureBudgetExhausted);
                }
                return Ok(false);
            }
            Err(fatal) => return Err(AnnealError::Objective(fatal)),
        };
        self.consecutive_failures = 0;

        let improved = match &self.best {
            Some((_, best)) => cost < *best,
            None => true,
        };
        if improved {
            self.best = Some((candidate.clone(), cost));
        }
        let best_cost = self.best.as_ref().map_or(cost, |(_, best)| *best);
        debug!(cost, best_cost, ?stage, "candidate scored");
        self.history.push(RestartEntry {
            embedding: candidate,
            cost,
            best_cost,
            stage,
        });
        Ok(true)
    }
}

#[instrument(skip_all, fields(size = size, samples = config.samples))]
fn search<O: Objective, R: Rng>(
    graph: &ConnectivityGraph,
    config: &RestartConfig,
    size: usize,
    objective: &mut ObjectiveAdapter<O>,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> Result<RestartResult> {
    let schedule = config.keep_schedule();
    let mut tracker = Tracker::new(config.failure_budget());
    let cancelled = || cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));

    info!(refinements = schedule.len(), "starting random-restart search");

    let mut samples_scored = 0;
    while samples_scored < config.samples && tracker.stop.is_none() {
        if samples_scored > 0 && cancelled() {
            tracker.stop = Some(RestartStop::Cancelled);
            break;
        }
        let candidate = Embedding::random(graph, size, rng);
        if tracker.score(objective, candidate, RestartStage::Sampling)? {
            samples_scored += 1;
        }
    }

    for &keep_probability in &schedule {
        if tracker.stop.is_some() {
            break;
        }
        if cancelled() {
            tracker.stop = Some(RestartStop::Cancelled);
            break;
        }
        let Some((best, _)) = &tracker.best else {
            break;
        };
        let candidate = partial_shuffle(best, keep_probability, rng);
        tracker.score(
            objective,
            candidate,
            RestartStage::Refinement { keep_probability },
        )?;
    }

    let Some((best_embedding, best_cost)) = tracker.best else {
        return Err(AnnealError::InitialEvaluation(ObjectiveError::transient(
            format!(
                "no random embedding could be scored in {} attempts",
                tracker.failed
            ),
        )));
    };

    let result = RestartResult {
        best_embedding,
        best_cost,
        samples_scored,
        total_evaluations: tracker.history.len(),
        history: tracker.history,
        failed_evaluations: tracker.failed,
        stop_reason: tracker.stop.unwrap_or(RestartStop::Completed),
    };
    info!(
        best_cost = result.best_cost,
        evaluations = result.total_evaluations,
        failed = result.failed_evaluations,
        stop = ?result.stop_reason,
        "random-restart search finished with {}",
        result.best_embedding
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anneal::mean_best_trace;

    type Cost = std::result::Result<f64, ObjectiveError>;

    /// Penalizes logical slot `i` sitting far from physical qubit `i`.
    fn slot_distance(e: &Embedding) -> Cost {
        Ok(e.iter()
            .enumerate()
            .map(|(i, q)| (f64::from(q) - i as f64).abs())
            .sum())
    }

    #[test]
    fn test_samples_then_refinements() {
        let graph = ConnectivityGraph::grid(4, 4).unwrap();
        let config = RestartConfig::default().with_seed(3);
        let result = RestartRunner::run(&graph, &config, 5, slot_distance).unwrap();

        assert_eq!(result.stop_reason, RestartStop::Completed);
        assert_eq!(result.samples_scored, 11);
        assert_eq!(result.total_evaluations, 11 + 19);
        assert_eq!(result.history.len(), 30);
        assert!(result.history[..11]
            .iter()
            .all(|h| h.stage == RestartStage::Sampling));
        assert!(matches!(
            result.history[11].stage,
            RestartStage::Refinement { keep_probability } if (keep_probability - 0.95).abs() < 1e-12
        ));

        let min = result
            .history
            .iter()
            .map(|h| h.cost)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(result.best_cost, min);
        for h in &result.history {
            assert_eq!(h.embedding.len(), 5);
            assert_eq!(h.embedding.physical_qubits().len(), 5);
        }
    }

    #[test]
    fn test_refinements_keep_best_qubit_set() {
        let graph = ConnectivityGraph::grid(4, 5).unwrap();
        let config = RestartConfig::default().with_samples(1).with_seed(9);
        let result = RestartRunner::run(&graph, &config, 6, slot_distance).unwrap();

        let sample_set = result.history[0].embedding.physical_qubits();
        for h in &result.history[1..] {
            assert_eq!(h.embedding.physical_qubits(), sample_set);
        }
    }

    #[test]
    fn test_trace_non_increasing_and_averaged() {
        let graph = ConnectivityGraph::grid(4, 4).unwrap();
        let results: Vec<RestartResult> = (0..4)
            .map(|seed| {
                let config = RestartConfig::default().with_seed(seed);
                RestartRunner::run(&graph, &config, 4, slot_distance).unwrap()
            })
            .collect();

        for r in &results {
            let trace = r.best_cost_trace();
            for w in trace.windows(2) {
                assert!(w[1] <= w[0]);
            }
            assert_eq!(*trace.last().unwrap(), r.best_cost);
        }
        let mean = mean_best_trace(&results);
        assert_eq!(mean.len(), 30);
    }

    #[test]
    fn test_transient_failures_skipped() {
        let graph = ConnectivityGraph::grid(4, 4).unwrap();
        let config = RestartConfig::default().with_seed(5);
        let mut calls = 0usize;
        let flaky = |e: &Embedding| -> Cost {
            calls += 1;
            if calls % 3 == 0 {
                Err(ObjectiveError::transient("compile failed"))
            } else {
                slot_distance(e)
            }
        };
        let result = RestartRunner::run(&graph, &config, 4, flaky).unwrap();

        assert_eq!(result.stop_reason, RestartStop::Completed);
        assert_eq!(result.samples_scored, 11);
        assert!(result.failed_evaluations > 0);
        assert_eq!(
            calls,
            result.total_evaluations + result.failed_evaluations
        );
        // Failed refinements still use up their schedule slot.
        let refinements = result.history.len() - result.samples_scored;
        assert!(refinements < 19);
    }

    #[test]
    fn test_always_failing_objective() {
        let graph = ConnectivityGraph::grid(3, 3).unwrap();
        let config = RestartConfig::default()
            .with_max_consecutive_failures(7)
            .with_seed(1);
        let mut calls = 0usize;
        let failing = |_: &Embedding| -> Cost {
            calls += 1;
            Err(ObjectiveError::transient("rejected"))
        };
        let err = RestartRunner::run(&graph, &config, 3, failing).unwrap_err();
        assert!(matches!(err, AnnealError::InitialEvaluation(_)));
        assert_eq!(calls, 7);
    }

    #[test]
    fn test_fatal_failure_aborts() {
        let graph = ConnectivityGraph::grid(3, 3).unwrap();
        let config = RestartConfig::default().with_seed(1);
        let failing = |_: &Embedding| -> Cost { Err(ObjectiveError::fatal("connection lost")) };
        let err = RestartRunner::run(&graph, &config, 3, failing).unwrap_err();
        assert!(matches!(err, AnnealError::Objective(_)));
    }

    #[test]
    fn test_invalid_sizes() {
        let graph = ConnectivityGraph::grid(2, 2).unwrap();
        let config = RestartConfig::default().with_seed(1);
        assert!(matches!(
            RestartRunner::run(&graph, &config, 0, slot_distance),
            Err(AnnealError::Subgraph(SubgraphError::ZeroTarget))
        ));
        assert!(matches!(
            RestartRunner::run(&graph, &config, 5, slot_distance),
            Err(AnnealError::EmbeddingSize {
                expected: 5,
                got: 4
            })
        ));
    }

    #[test]
    fn test_cancellation_after_first_sample() {
        let graph = ConnectivityGraph::grid(3, 3).unwrap();
        let config = RestartConfig::default().with_seed(2);
        let cancel = Arc::new(AtomicBool::new(true));
        let result =
            RestartRunner::run_with_cancel(&graph, &config, 3, slot_distance, Some(cancel))
                .unwrap();
        assert_eq!(result.stop_reason, RestartStop::Cancelled);
        assert_eq!(result.total_evaluations, 1);
    }

    #[test]
    fn test_seed_reproducible() {
        let graph = ConnectivityGraph::grid(4, 4).unwrap();
        let config = RestartConfig::default().with_seed(12);
        let a = RestartRunner::run(&graph, &config, 4, slot_distance).unwrap();
        let b = RestartRunner::run(&graph, &config, 4, slot_distance).unwrap();
        assert_eq!(a.history, b.history);
    }
}
