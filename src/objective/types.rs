//! Objective trait and routing-cost metrics.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;
use crate::error::ObjectiveError;

/// Scores a candidate embedding. Lower is better.
///
/// Typically backed by a circuit compiler: the circuit is mapped onto the
/// embedding, compiled for the device, and the routing overhead reported.
/// Return [`ObjectiveError::Transient`] when this particular candidate
/// cannot be scored but the search should go on; any
/// [`ObjectiveError::Fatal`] aborts the run.
///
/// Implemented for closures:
///
/// ```
/// use u_embed::{Embedding, ObjectiveError};
/// use u_embed::objective::Objective;
///
/// let mut spread = |e: &Embedding| -> Result<f64, ObjectiveError> {
///     let q = e.physical_qubits();
///     Ok(f64::from(q[q.len() - 1] - q[0]))
/// };
/// let e = Embedding::new(vec![4, 1, 7]).unwrap();
/// assert_eq!(spread.evaluate(&e).unwrap(), 6.0);
/// ```
pub trait Objective {
    /// Computes the cost of `embedding`.
    fn evaluate(&mut self, embedding: &Embedding) -> Result<f64, ObjectiveError>;
}

impl<F> Objective for F
where
    F: FnMut(&Embedding) -> Result<f64, ObjectiveError>,
{
    fn evaluate(&mut self, embedding: &Embedding) -> Result<f64, ObjectiveError> {
        self(embedding)
    }
}

/// Routing figures reported by a compiler for one embedding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutingMetrics {
    /// SWAP gates inserted to satisfy connectivity.
    pub swaps: u32,
    /// Depth of the compiled circuit.
    pub depth: u32,
}

impl RoutingMetrics {
    /// Combined cost: swaps plus depth.
    pub fn cost(&self) -> f64 {
        f64::from(self.swaps) + f64::from(self.depth)
    }
}

/// Adapts a compiler callback that reports [`RoutingMetrics`] into an
/// [`Objective`] scoring `swaps + depth`.
pub struct MetricsObjective<F> {
    compile: F,
}

impl<F> MetricsObjective<F>
where
    F: FnMut(&Embedding) -> Result<RoutingMetrics, ObjectiveError>,
{
    /// Wraps `compile`.
    pub fn new(compile: F) -> Self {
        Self { compile }
    }
}

impl<F> Objective for MetricsObjective<F>
where
    F: FnMut(&Embedding) -> Result<RoutingMetrics, ObjectiveError>,
{
    fn evaluate(&mut self, embedding: &Embedding) -> Result<f64, ObjectiveError> {
        (self.compile)(embedding).map(|m| m.cost())
    }
}
