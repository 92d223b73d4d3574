//! Per-run annealing state and the single-step transition.

use rand::Rng;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::config::AnnealConfig;
use crate::embedding::Embedding;
use crate::error::{AnnealError, ObjectiveError, Result};
use crate::graph::ConnectivityGraph;
use crate::objective::{Objective, ObjectiveAdapter};

/// Metropolis acceptance: accept with probability `min(1, exp(-delta / T))`.
///
/// `eta` is a uniform draw in `[0, 1)`. Non-worsening moves (`delta <= 0`)
/// are always accepted, whatever `eta` and `temperature` are.
pub fn metropolis_accept(delta: f64, temperature: f64, eta: f64) -> bool {
    delta <= 0.0 || eta < (-delta / temperature).exp()
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StopReason {
    /// `max_iterations` candidates were evaluated.
    MaxIterations,
    /// The temperature fell to `final_temperature`.
    FinalTemperature,
    /// Too many back-to-back transient evaluation failures.
    FailureBudgetExhausted,
    /// Cancelled by the caller.
    Cancelled,
}

/// Lifecycle of an annealing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Steps are still being taken.
    Running,
    /// No further steps will run.
    Stopped(StopReason),
}

/// One evaluated step of the trace.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryEntry {
    /// Current embedding after the step.
    pub embedding: Embedding,
    /// Current cost after the step.
    pub cost: f64,
    /// Cost of the candidate proposed in this step.
    pub proposed_cost: f64,
    /// Best cost after the step.
    pub best_cost: f64,
    /// Temperature used for the acceptance draw.
    pub temperature: f64,
    /// Whether the candidate became current.
    pub accepted: bool,
}

/// What a call to [`AnnealState::step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The candidate was scored and the acceptance rule applied.
    Evaluated {
        /// Candidate cost.
        proposed_cost: f64,
        /// Whether it was accepted.
        accepted: bool,
    },
    /// The candidate could not be scored and was dropped. Counters and
    /// current position are untouched.
    Discarded,
    /// The run had already stopped; nothing was done.
    Halted,
}

/// Mutable state of one annealing run.
///
/// Owned by a single run and advanced only through [`step`](Self::step).
/// `best_*` is tracked apart from `current_*` because the acceptance rule
/// may move to worse embeddings.
#[derive(Debug, Clone)]
pub struct AnnealState {
    pub(crate) current_embedding: Embedding,
    pub(crate) current_cost: f64,
    pub(crate) best_embedding: Embedding,
    pub(crate) best_cost: f64,
    pub(crate) iteration: usize,
    pub(crate) inner_count: usize,
    pub(crate) temperature_step: usize,
    pub(crate) temperature: f64,
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) accepted_moves: usize,
    pub(crate) improving_moves: usize,
    pub(crate) failed_evaluations: usize,
    pub(crate) consecutive_failures: usize,
    pub(crate) phase: Phase,
}

impl AnnealState {
    /// Starts a run at `initial` with its already evaluated `cost`.
    pub fn new(config: &AnnealConfig, initial: Embedding, cost: f64) -> Self {
        Self {
            best_embedding: initial.clone(),
            current_embedding: initial,
            current_cost: cost,
            best_cost: cost,
            iteration: 0,
            inner_count: 0,
            temperature_step: 0,
            temperature: config.initial_temperature,
            history: Vec::with_capacity(config.max_iterations.min(4096)),
            accepted_moves: 0,
            improving_moves: 0,
            failed_evaluations: 0,
            consecutive_failures: 0,
            phase: Phase::Running,
        }
    }

    /// Proposes, scores and possibly accepts one candidate.
    ///
    /// A transient evaluation failure leaves every counter except the
    /// failure tallies unchanged and returns [`StepOutcome::Discarded`];
    /// the caller simply steps again. When the failure budget runs out the
    /// run stops with [`StopReason::FailureBudgetExhausted`].
    ///
    /// # Errors
    ///
    /// Graph lookups during perturbation and fatal objective failures.
    pub fn step<O: Objective, R: Rng>(
        &mut self,
        graph: &ConnectivityGraph,
        config: &AnnealConfig,
        objective: &mut ObjectiveAdapter<O>,
        rng: &mut R,
    ) -> Result<StepOutcome> {
        if self.phase != Phase::Running {
            return Ok(StepOutcome::Halted);
        }

        let proposed = config
            .perturbation
            .apply(graph, &self.current_embedding, rng)?;

        let proposed_cost = match objective.evaluate(&proposed) {
            Ok(cost) => cost,
            Err(ObjectiveError::Transient(_)) => {
                self.failed_evaluations += 1;
                self.consecutive_failures += 1;
                if self.consecutive_failures >= config.failure_budget() {
                    warn!(
                        failures = self.consecutive_failures,
                        iteration = self.iteration,
                        "stopping: every recent evaluation failed"
                    );
                    self.phase = Phase::Stopped(StopReason::FailureBudgetExhausted);
                }
                return Ok(StepOutcome::Discarded);
            }
            Err(fatal) => return Err(AnnealError::Objective(fatal)),
        };
        self.consecutive_failures = 0;

        self.iteration += 1;
        self.inner_count += 1;
        let delta = proposed_cost - self.current_cost;

        if self.inner_count == config.steps_per_temperature {
            self.temperature_step += 1;
            self.temperature = config.temperature_at(self.temperature_step);
            self.inner_count = 0;
        }

        let eta: f64 = rng.random();
        let accepted = metropolis_accept(delta, self.temperature, eta);
        if accepted {
            if proposed_cost < self.best_cost {
                self.best_embedding = proposed.clone();
                self.best_cost = proposed_cost;
            }
            if delta < 0.0 {
                self.improving_moves += 1;
            }
            self.accepted_moves += 1;
            self.current_embedding = proposed;
            self.current_cost = proposed_cost;
        }

        debug!(
            iteration = self.iteration,
            proposed_cost,
            current_cost = self.current_cost,
            temperature = self.temperature,
            accepted,
            "annealing step"
        );

        self.history.push(HistoryEntry {
            embedding: self.current_embedding.clone(),
            cost: self.current_cost,
            proposed_cost,
            best_cost: self.best_cost,
            temperature: self.temperature,
            accepted,
        });

        if self.iteration >= config.max_iterations {
            self.phase = Phase::Stopped(StopReason::MaxIterations);
        } else if self.temperature <= config.final_temperature {
            self.phase = Phase::Stopped(StopReason::FinalTemperature);
        }

        Ok(StepOutcome::Evaluated {
            proposed_cost,
            accepted,
        })
    }

    /// Stops the run from outside (cancellation).
    pub(crate) fn cancel(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Stopped(StopReason::Cancelled);
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether [`step`](Self::step) will do any work.
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Embedding the search is currently at.
    pub fn current_embedding(&self) -> &Embedding {
        &self.current_embedding
    }

    /// Cost of the current embedding.
    pub fn current_cost(&self) -> f64 {
        self.current_cost
    }

    /// Cheapest embedding accepted so far.
    pub fn best_embedding(&self) -> &Embedding {
        &self.best_embedding
    }

    /// Cost of the best embedding.
    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    /// Successfully evaluated candidates so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Temperature used by the next acceptance draw.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Completed temperature steps.
    pub fn temperature_step(&self) -> usize {
        self.temperature_step
    }

    /// Evaluated steps so far.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perturb::Perturbation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type Cost = std::result::Result<f64, ObjectiveError>;

    fn setup() -> (ConnectivityGraph, AnnealConfig, Embedding) {
        let graph = ConnectivityGraph::grid(3, 4).unwrap();
        let config = AnnealConfig::default().with_seed(1);
        let initial = Embedding::new(vec![0, 1, 2, 6]).unwrap();
        (graph, config, initial)
    }

    #[test]
    fn test_metropolis_non_worsening_always_accepted() {
        for &t in &[1e-9, 0.1, 1.0, 1e9] {
            for &eta in &[0.0, 0.5, 0.999_999] {
                assert!(metropolis_accept(0.0, t, eta));
                assert!(metropolis_accept(-3.0, t, eta));
            }
        }
    }

    #[test]
    fn test_metropolis_worsening() {
        // exp(-1) ~ 0.3679
        assert!(metropolis_accept(1.0, 1.0, 0.3));
        assert!(!metropolis_accept(1.0, 1.0, 0.4));
        assert!(!metropolis_accept(5.0, 1e-6, 1e-12));
    }

    #[test]
    fn test_step_improving_move_updates_best() {
        let (graph, config, initial) = setup();
        let mut state = AnnealState::new(&config, initial, 100.0);
        let mut objective = ObjectiveAdapter::new(|_: &Embedding| -> Cost { Ok(50.0) });
        let mut rng = StdRng::seed_from_u64(3);

        let outcome = state.step(&graph, &config, &mut objective, &mut rng).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Evaluated {
                proposed_cost: 50.0,
                accepted: true
            }
        );
        assert_eq!(state.iteration(), 1);
        assert_eq!(state.best_cost(), 50.0);
        assert_eq!(state.current_cost(), 50.0);
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.best_embedding(), state.current_embedding());
    }

    #[test]
    fn test_step_transient_failure_leaves_state() {
        let (graph, config, initial) = setup();
        let mut state = AnnealState::new(&config, initial.clone(), 42.0);
        let mut objective = ObjectiveAdapter::new(|_: &Embedding| -> Cost {
            Err(ObjectiveError::transient("invalid compiled program"))
        });
        let mut rng = StdRng::seed_from_u64(3);

        let outcome = state.step(&graph, &config, &mut objective, &mut rng).unwrap();
        assert_eq!(outcome, StepOutcome::Discarded);
        assert_eq!(state.current_embedding(), &initial);
        assert_eq!(state.current_cost(), 42.0);
        assert_eq!(state.iteration(), 0);
        assert_eq!(state.temperature_step(), 0);
        assert!(state.history().is_empty());
        assert!(state.is_running());
    }

    #[test]
    fn test_step_fatal_failure_propagates() {
        let (graph, config, initial) = setup();
        let mut state = AnnealState::new(&config, initial, 42.0);
        let mut objective = ObjectiveAdapter::new(|_: &Embedding| -> Cost {
            Err(ObjectiveError::fatal("compiler unreachable"))
        });
        let mut rng = StdRng::seed_from_u64(3);

        let err = state
            .step(&graph, &config, &mut objective, &mut rng)
            .unwrap_err();
        assert!(matches!(err, AnnealError::Objective(_)));
    }

    #[test]
    fn test_temperature_advances_per_block() {
        let (graph, _, initial) = setup();
        let config = AnnealConfig::default().with_steps_per_temperature(3);
        let mut state = AnnealState::new(&config, initial, 10.0);
        let mut objective = ObjectiveAdapter::new(|_: &Embedding| -> Cost { Ok(10.0) });
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..7 {
            state.step(&graph, &config, &mut objective, &mut rng).unwrap();
        }
        assert_eq!(state.iteration(), 7);
        assert_eq!(state.temperature_step(), 2);
        assert!((state.temperature() - config.temperature_at(2)).abs() < 1e-12);
        // Ties are always accepted.
        assert!(state.history().iter().all(|h| h.accepted));
    }

    #[test]
    fn test_stops_on_max_iterations() {
        let (graph, _, initial) = setup();
        let config = AnnealConfig::default().with_max_iterations(2);
        let mut state = AnnealState::new(&config, initial, 10.0);
        let mut objective = ObjectiveAdapter::new(|_: &Embedding| -> Cost { Ok(10.0) });
        let mut rng = StdRng::seed_from_u64(0);

        state.step(&graph, &config, &mut objective, &mut rng).unwrap();
        assert!(state.is_running());
        state.step(&graph, &config, &mut objective, &mut rng).unwrap();
        assert_eq!(state.phase(), Phase::Stopped(StopReason::MaxIterations));
        assert_eq!(
            state.step(&graph, &config, &mut objective, &mut rng).unwrap(),
            StepOutcome::Halted
        );
        assert_eq!(state.iteration(), 2);
    }

    #[test]
    fn test_failure_budget_stops_run() {
        let (graph, _, initial) = setup();
        let config = AnnealConfig::default()
            .with_perturbation(Perturbation::Chain(2))
            .with_max_consecutive_failures(3);
        let mut state = AnnealState::new(&config, initial, 10.0);
        let mut objective = ObjectiveAdapter::new(|_: &Embedding| -> Cost {
            Err(ObjectiveError::transient("rejected"))
        });
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..3 {
            assert_eq!(
                state.step(&graph, &config, &mut objective, &mut rng).unwrap(),
                StepOutcome::Discarded
            );
        }
        assert_eq!(
            state.phase(),
            Phase::Stopped(StopReason::FailureBudgetExhausted)
        );
        assert_eq!(state.failed_evaluations, 3);
        assert_eq!(objective.evaluations(), 3);
    }
}
