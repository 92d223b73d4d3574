//! Per-qubit and per-edge fidelity annotations.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Named fidelity series attached to a connectivity graph.
///
/// Each `single_qubit` series holds one value per qubit, in the order of
/// [`ConnectivityGraph::qubits`](super::ConnectivityGraph::qubits). Each
/// `two_qubit` series holds one value per edge, in the order of
/// [`ConnectivityGraph::edges`](super::ConnectivityGraph::edges).
///
/// Typical series names are `f1QRB` and `fRO` for single qubits and `fCZ`
/// and `fCPHASE` for pairs. The search never reads or mutates these values;
/// they are carried for objectives and reporting.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fidelity {
    /// Single-qubit series keyed by name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub single_qubit: BTreeMap<String, Vec<f64>>,
    /// Two-qubit series keyed by name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub two_qubit: BTreeMap<String, Vec<f64>>,
}

impl Fidelity {
    /// Creates an empty annotation set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single-qubit series.
    pub fn with_single_qubit(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.single_qubit.insert(name.into(), values);
        self
    }

    /// Adds a two-qubit series.
    pub fn with_two_qubit(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.two_qubit.insert(name.into(), values);
        self
    }

    /// Whether no series are present.
    pub fn is_empty(&self) -> bool {
        self.single_qubit.is_empty() && self.two_qubit.is_empty()
    }

    pub(crate) fn validate(&self, num_qubits: usize, num_edges: usize) -> Result<(), GraphError> {
        for (name, values) in &self.single_qubit {
            if values.len() != num_qubits {
                return Err(GraphError::FidelityLengthMismatch {
                    kind: "single-qubit",
                    name: name.clone(),
                    expected: num_qubits,
                    got: values.len(),
                });
            }
        }
        for (name, values) in &self.two_qubit {
            if values.len() != num_edges {
                return Err(GraphError::FidelityLengthMismatch {
                    kind: "two-qubit",
                    name: name.clone(),
                    expected: num_edges,
                    got: values.len(),
                });
            }
        }
        Ok(())
    }

    /// Keeps only the entries whose mask bit is set.
    pub(crate) fn retain(&self, keep_qubit: &[bool], keep_edge: &[bool]) -> Self {
        let filter = |values: &Vec<f64>, mask: &[bool]| -> Vec<f64> {
            values
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(&v, _)| v)
                .collect()
        };
        Self {
            single_qubit: self
                .single_qubit
                .iter()
                .map(|(k, v)| (k.clone(), filter(v, keep_qubit)))
                .collect(),
            two_qubit: self
                .two_qubit
                .iter()
                .map(|(k, v)| (k.clone(), filter(v, keep_edge)))
                .collect(),
        }
    }
}
