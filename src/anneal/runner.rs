//! Annealing execution loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, instrument, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::config::{AnnealConfig, ScheduleWarning};
use super::state::{AnnealState, HistoryEntry, Phase, StepOutcome, StopReason};
use crate::embedding::Embedding;
use crate::error::{AnnealError, ObjectiveError, Result};
use crate::graph::ConnectivityGraph;
use crate::objective::{Objective, ObjectiveAdapter};
use crate::subgraph::SubgraphGenerator;

/// Result of an annealing run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnnealResult {
    /// Best embedding observed.
    pub best_embedding: Embedding,

    /// Cost of the best embedding.
    pub best_cost: f64,

    /// Starting embedding.
    pub initial_embedding: Embedding,

    /// Cost of the starting embedding.
    pub initial_cost: f64,

    /// Successfully evaluated candidates.
    pub total_iterations: usize,

    /// One entry per evaluated candidate, in order.
    pub history: Vec<HistoryEntry>,

    /// Temperature when the run stopped.
    pub final_temperature: f64,

    /// Completed temperature steps.
    pub temperature_steps: usize,

    /// Accepted moves, including improvements.
    pub accepted_moves: usize,

    /// Accepted moves that lowered the current cost.
    pub improving_moves: usize,

    /// Candidates discarded after a transient evaluation failure.
    pub failed_evaluations: usize,

    /// Why the run ended.
    pub stop_reason: StopReason,

    /// Set when the schedule could not reach the final temperature within
    /// the iteration budget.
    pub schedule_warning: Option<ScheduleWarning>,
}

impl AnnealResult {
    fn from_state(
        state: AnnealState,
        initial_embedding: Embedding,
        initial_cost: f64,
        schedule_warning: Option<ScheduleWarning>,
    ) -> Self {
        let stop_reason = match state.phase {
            Phase::Stopped(reason) => reason,
            Phase::Running => StopReason::Cancelled,
        };
        Self {
            best_embedding: state.best_embedding,
            best_cost: state.best_cost,
            initial_embedding,
            initial_cost,
            total_iterations: state.iteration,
            history: state.history,
            final_temperature: state.temperature,
            temperature_steps: state.temperature_step,
            accepted_moves: state.accepted_moves,
            improving_moves: state.improving_moves,
            failed_evaluations: state.failed_evaluations,
            stop_reason,
            schedule_warning,
        }
    }

    /// Best cost after each evaluated step, starting with the initial cost.
    ///
    /// Plotted against the number of compiler calls this shows how quickly
    /// the search converges.
    pub fn best_cost_trace(&self) -> Vec<f64> {
        std::iter::once(self.initial_cost)
            .chain(self.history.iter().map(|h| h.best_cost))
            .collect()
    }

    /// Fraction of evaluated candidates that were accepted.
    pub fn acceptance_ratio(&self) -> f64 {
        if self.total_iterations == 0 {
            0.0
        } else {
            self.accepted_moves as f64 / self.total_iterations as f64
        }
    }
}

/// Executes the annealing search.
pub struct AnnealRunner;

impl AnnealRunner {
    /// Scores `initial` and anneals from it.
    ///
    /// # Errors
    ///
    /// Invalid configuration, an embedding that references qubits outside
    /// `graph`, an initial embedding that cannot be scored, or a fatal
    /// objective failure during the search.
    pub fn run<O: Objective>(
        graph: &ConnectivityGraph,
        config: &AnnealConfig,
        initial: Embedding,
        objective: O,
    ) -> Result<AnnealResult> {
        Self::run_with_cancel(graph, config, initial, objective, None)
    }

    /// Like [`run`](Self::run) with a cooperative cancellation flag, checked
    /// before every proposal.
    pub fn run_with_cancel<O: Objective>(
        graph: &ConnectivityGraph,
        config: &AnnealConfig,
        initial: Embedding,
        objective: O,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<AnnealResult> {
        let mut rng = create_rng(config.seed);
        Self::run_with_rng(graph, config, initial, objective, &mut rng, cancel.as_deref())
    }

    /// Anneals from `initial` whose cost the caller already knows.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run); a non-finite `initial_cost` is reported as
    /// [`AnnealError::InitialEvaluation`].
    pub fn run_from<O: Objective>(
        graph: &ConnectivityGraph,
        config: &AnnealConfig,
        initial: Embedding,
        initial_cost: f64,
        objective: O,
    ) -> Result<AnnealResult> {
        validate_inputs(graph, config, &initial)?;
        if !initial_cost.is_finite() {
            return Err(AnnealError::InitialEvaluation(ObjectiveError::transient(
                format!("initial cost {initial_cost} is not finite"),
            )));
        }
        let mut rng = create_rng(config.seed);
        let mut adapter = ObjectiveAdapter::new(objective);
        anneal(
            graph,
            config,
            initial,
            initial_cost,
            &mut adapter,
            &mut rng,
            None,
        )
    }

    /// Anneals from a random connected subgraph of `size` qubits.
    pub fn run_random_start<O: Objective>(
        graph: &ConnectivityGraph,
        config: &AnnealConfig,
        size: usize,
        objective: O,
    ) -> Result<AnnealResult> {
        config.validate()?;
        let mut rng = create_rng(config.seed);
        let initial = SubgraphGenerator::new(graph, size)?.connected_from_random_start(&mut rng)?;
        Self::run_with_rng(graph, config, initial, objective, &mut rng, None)
    }

    /// Runs with a caller-supplied random source. All draws of the run
    /// (proposals and acceptance) come from `rng`.
    pub fn run_with_rng<O: Objective, R: Rng>(
        graph: &ConnectivityGraph,
        config: &AnnealConfig,
        initial: Embedding,
        objective: O,
        rng: &mut R,
        cancel: Option<&AtomicBool>,
    ) -> Result<AnnealResult> {
        validate_inputs(graph, config, &initial)?;
        let mut adapter = ObjectiveAdapter::new(objective);
        let initial_cost = adapter
            .evaluate(&initial)
            .map_err(AnnealError::InitialEvaluation)?;
        anneal(graph, config, initial, initial_cost, &mut adapter, rng, cancel)
    }
}

pub(crate) fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn validate_inputs(
    graph: &ConnectivityGraph,
    config: &AnnealConfig,
    initial: &Embedding,
) -> Result<()> {
    config.validate()?;
    if initial.is_empty() {
        return Err(AnnealError::EmptyEmbedding);
    }
    initial.check_against(graph)?;
    Ok(())
}

#[instrument(skip_all, fields(size = initial.len(), perturbation = config.perturbation.name()))]
fn anneal<O: Objective, R: Rng>(
    graph: &ConnectivityGraph,
    config: &AnnealConfig,
    initial: Embedding,
    initial_cost: f64,
    objective: &mut ObjectiveAdapter<O>,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> Result<AnnealResult> {
    let schedule_warning = config.schedule_warning();
    if let Some(warning) = &schedule_warning {
        warn!("{warning}");
    }

    info!(
        initial_cost,
        initial_temperature = config.initial_temperature,
        final_temperature = config.final_temperature,
        max_iterations = config.max_iterations,
        "starting annealing from {initial}"
    );

    let mut state = AnnealState::new(config, initial.clone(), initial_cost);
    while state.is_running() {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            state.cancel();
            break;
        }
        if let StepOutcome::Halted = state.step(graph, config, objective, rng)? {
            break;
        }
    }

    let result = AnnealResult::from_state(state, initial, initial_cost, schedule_warning);
    info!(
        best_cost = result.best_cost,
        iterations = result.total_iterations,
        failed = result.failed_evaluations,
        stop = ?result.stop_reason,
        "annealing finished with {}",
        result.best_embedding
    );
    Ok(result)
}
