//! Error types for embedding search.

use thiserror::Error;

/// Errors raised while building or querying a [`ConnectivityGraph`](crate::graph::ConnectivityGraph).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// Qubit not present in the graph.
    #[error("qubit {qubit} not found in connectivity graph")]
    QubitNotFound {
        /// The qubit that was looked up.
        qubit: u32,
    },

    /// Qubit listed more than once.
    #[error("qubit {qubit} listed more than once")]
    DuplicateQubit {
        /// The repeated qubit.
        qubit: u32,
    },

    /// An adjacency pair references a qubit that is not in the qubit list.
    #[error("edge {edge:?} references unknown qubit {qubit}")]
    UnknownEdgeEndpoint {
        /// The offending edge.
        edge: (u32, u32),
        /// The endpoint missing from the qubit list.
        qubit: u32,
    },

    /// An adjacency pair connects a qubit to itself.
    #[error("self-loop on qubit {qubit}")]
    SelfLoop {
        /// The qubit.
        qubit: u32,
    },

    /// A fidelity series does not line up with the qubits or edges it annotates.
    #[error("{kind} fidelity series '{name}' has {got} entries, expected {expected}")]
    FidelityLengthMismatch {
        /// `"single-qubit"` or `"two-qubit"`.
        kind: &'static str,
        /// Series name, e.g. `fCZ`.
        name: String,
        /// Number of qubits or edges.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// The graph has no qubits.
    #[error("connectivity graph has no qubits")]
    Empty,
}

/// Errors raised by connected-subgraph generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SubgraphError {
    /// Underlying graph lookup failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The component reachable from `start` is smaller than requested.
    #[error("component of qubit {start} has {reached} qubits, fewer than the {target} requested")]
    ComponentTooSmall {
        /// Start qubit of the traversal.
        start: u32,
        /// Requested subgraph size.
        target: usize,
        /// Number of qubits actually reached.
        reached: usize,
    },

    /// No start qubit produced a full-size subgraph.
    #[error("no connected subgraph of {target} qubits found after {attempts} attempts")]
    NoConnectedSubgraph {
        /// Requested subgraph size.
        target: usize,
        /// Number of start qubits tried.
        attempts: usize,
    },

    /// A subgraph of size zero was requested.
    #[error("target subgraph size must be positive")]
    ZeroTarget,
}

/// Invalid annealing configuration. Raised before the search loop starts.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A temperature is zero, negative or not finite.
    #[error("{name} must be positive and finite, got {value}")]
    NonPositiveTemperature {
        /// Field name.
        name: &'static str,
        /// Supplied value.
        value: f64,
    },

    /// `final_temperature >= initial_temperature`.
    #[error("final_temperature ({final_temperature}) must be less than initial_temperature ({initial_temperature})")]
    FinalNotBelowInitial {
        /// Initial temperature.
        initial_temperature: f64,
        /// Final temperature.
        final_temperature: f64,
    },

    /// `time_constant` is zero, negative or not finite.
    #[error("time_constant must be positive and finite, got {0}")]
    NonPositiveTimeConstant(f64),

    /// `steps_per_temperature == 0`.
    #[error("steps_per_temperature must be positive")]
    ZeroStepsPerTemperature,

    /// `max_iterations == 0`.
    #[error("max_iterations must be positive")]
    ZeroMaxIterations,

    /// `max_consecutive_failures == Some(0)`.
    #[error("max_consecutive_failures must be positive")]
    ZeroFailureBudget,

    /// Chained perturbation length outside `1..=4`.
    #[error("perturbation chain length must be in 1..=4, got {0}")]
    InvalidChainLength(usize),

    /// Partial-shuffle keep probability outside `[0, 1]`.
    #[error("keep_probability must be in [0, 1], got {0}")]
    InvalidKeepProbability(f64),

    /// Random-restart search configured with no samples.
    #[error("samples must be positive")]
    ZeroSamples,

    /// Keep-probability decrement is zero, negative or not finite.
    #[error("keep_probability_step must be positive and finite, got {0}")]
    InvalidKeepStep(f64),
}

/// Failure signal returned by an [`Objective`](crate::objective::Objective).
///
/// `Transient` is the only recoverable class: the runner discards the
/// candidate and retries. `Fatal` aborts the run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ObjectiveError {
    /// The evaluator could not score this candidate (e.g. a compilation
    /// request was rejected). The search continues.
    #[error("transient evaluation failure: {0}")]
    Transient(String),

    /// Any other evaluator failure. The search stops.
    #[error("fatal evaluation failure: {0}")]
    Fatal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ObjectiveError {
    /// Creates a transient failure.
    pub fn transient(msg: impl Into<String>) -> Self {
        ObjectiveError::Transient(msg.into())
    }

    /// Creates a fatal failure from any error.
    pub fn fatal(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ObjectiveError::Fatal(err.into())
    }

    /// Whether the runner may recover from this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, ObjectiveError::Transient(_))
    }
}

/// Errors that terminate an annealing run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnnealError {
    /// Invalid configuration.
    #[error("invalid annealing configuration: {0}")]
    Config(#[from] ConfigError),

    /// Graph lookup failed; indicates an embedding built against another graph.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Subgraph generation failed.
    #[error(transparent)]
    Subgraph(#[from] SubgraphError),

    /// The objective reported a non-recoverable failure.
    #[error("objective evaluation failed")]
    Objective(#[source] ObjectiveError),

    /// The initial embedding could not be scored.
    #[error("initial embedding could not be evaluated")]
    InitialEvaluation(#[source] ObjectiveError),

    /// The device has fewer qubits than the requested embedding size.
    #[error("embedding of {expected} qubits requested, device has only {got}")]
    EmbeddingSize {
        /// Requested length.
        expected: usize,
        /// Qubits available.
        got: usize,
    },

    /// Embedding with no qubits.
    #[error("embedding has no qubits")]
    EmptyEmbedding,

    /// Embedding maps two logical qubits to one physical qubit.
    #[error("physical qubit {qubit} appears more than once in embedding")]
    DuplicateInEmbedding {
        /// The repeated physical qubit.
        qubit: u32,
    },
}

/// Result alias for annealing operations.
pub type Result<T, E = AnnealError> = std::result::Result<T, E>;
