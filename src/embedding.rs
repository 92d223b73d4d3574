//! Logical-to-physical qubit assignment.

use std::collections::HashSet;
use std::fmt;

use rand::seq::IndexedRandom;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{AnnealError, GraphError};
use crate::graph::ConnectivityGraph;

/// An ordered placement of logical qubits onto physical qubits.
///
/// Slot `i` holds the physical qubit that logical qubit `i` runs on, so
/// the order is significant. No physical qubit appears twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "Vec<u32>", into = "Vec<u32>")
)]
pub struct Embedding(Vec<u32>);

impl Embedding {
    /// Wraps a qubit list, rejecting duplicates.
    pub fn new(qubits: Vec<u32>) -> Result<Self, AnnealError> {
        let mut seen = HashSet::with_capacity(qubits.len());
        for &q in &qubits {
            if !seen.insert(q) {
                return Err(AnnealError::DuplicateInEmbedding { qubit: q });
            }
        }
        Ok(Self(qubits))
    }

    /// Wraps a list known to be duplicate-free (traversal or permutation output).
    pub(crate) fn from_distinct(qubits: Vec<u32>) -> Self {
        debug_assert_eq!(
            qubits.iter().collect::<HashSet<_>>().len(),
            qubits.len(),
            "embedding built from non-distinct qubits"
        );
        Self(qubits)
    }

    /// `n` distinct qubits sampled uniformly from the graph, with no
    /// connectivity requirement. If `n` exceeds the qubit count, every
    /// qubit is returned in random order.
    pub fn random<R: Rng>(graph: &ConnectivityGraph, n: usize, rng: &mut R) -> Self {
        let picked: Vec<u32> = graph.qubits().choose_multiple(rng, n).copied().collect();
        Self(picked)
    }

    /// Checks that every physical qubit exists in `graph`.
    pub fn check_against(&self, graph: &ConnectivityGraph) -> Result<(), GraphError> {
        match self.0.iter().find(|&&q| !graph.contains(q)) {
            Some(&qubit) => Err(GraphError::QubitNotFound { qubit }),
            None => Ok(()),
        }
    }

    /// Number of logical qubits.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the embedding is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Physical qubit assigned to logical qubit `logical`.
    pub fn physical(&self, logical: usize) -> Option<u32> {
        self.0.get(logical).copied()
    }

    /// Physical qubits in slot order.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Iterates physical qubits in slot order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// The occupied physical qubits, sorted. Two embeddings that differ only
    /// in slot order have the same set.
    pub fn physical_qubits(&self) -> Vec<u32> {
        let mut set = self.0.clone();
        set.sort_unstable();
        set
    }

    /// Consumes the embedding and returns the qubit list.
    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }
}

impl TryFrom<Vec<u32>> for Embedding {
    type Error = AnnealError;

    fn try_from(qubits: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(qubits)
    }
}

impl From<Embedding> for Vec<u32> {
    fn from(embedding: Embedding) -> Self {
        embedding.0
    }
}

impl fmt::Display for Embedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, q) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{q}")?;
        }
        write!(f, "]")
    }
}
