//! Physical qubit connectivity model.

use std::collections::{HashMap, HashSet, VecDeque};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::fidelity::Fidelity;
use crate::error::GraphError;

/// Raw device shape consumed by [`ConnectivityGraph`]: qubit labels,
/// adjacency pairs and optional fidelity series.
///
/// Collaborators that parse vendor device files produce this value;
/// dead qubits are expected to be excluded already (or removed later via
/// [`ConnectivityGraph::without_qubits`]).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceSpec {
    /// Physical qubit labels.
    pub qubits: Vec<u32>,
    /// Directly coupled pairs. Orientation is ignored.
    pub edges: Vec<(u32, u32)>,
    /// Optional fidelity annotations.
    #[cfg_attr(feature = "serde", serde(default))]
    pub fidelity: Fidelity,
}

/// Immutable hardware connectivity graph.
///
/// Qubit labels are arbitrary non-negative integers (devices routinely skip
/// labels of broken qubits). Edges are undirected: `(a, b)` and `(b, a)`
/// describe the same coupling and only the first occurrence is kept.
///
/// The graph is built once and then shared read-only by subgraph
/// generation, perturbation and every annealing run, so it is `Send + Sync`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "DeviceSpec", into = "DeviceSpec")
)]
pub struct ConnectivityGraph {
    qubits: Vec<u32>,
    edges: Vec<(u32, u32)>,
    /// Label -> position in `qubits`.
    index: HashMap<u32, usize>,
    /// Neighbors per position, in edge insertion order.
    adjacency: Vec<Vec<u32>>,
    fidelity: Fidelity,
}

impl ConnectivityGraph {
    /// Builds a graph from explicit qubit labels and adjacency pairs.
    ///
    /// # Errors
    ///
    /// Fails when the qubit list is empty or has duplicates, or when an edge
    /// is a self-loop or references a label not in `qubits`.
    pub fn new(qubits: Vec<u32>, edges: Vec<(u32, u32)>) -> Result<Self, GraphError> {
        if qubits.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut index = HashMap::with_capacity(qubits.len());
        for (pos, &q) in qubits.iter().enumerate() {
            if index.insert(q, pos).is_some() {
                return Err(GraphError::DuplicateQubit { qubit: q });
            }
        }

        let mut graph = Self {
            adjacency: vec![Vec::new(); qubits.len()],
            qubits,
            edges: Vec::with_capacity(edges.len()),
            index,
            fidelity: Fidelity::default(),
        };
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    /// Builds a graph whose qubits are exactly the endpoints of `edges`,
    /// labelled in first-seen order.
    pub fn from_edges(edges: Vec<(u32, u32)>) -> Result<Self, GraphError> {
        let mut seen = HashSet::new();
        let mut qubits = Vec::new();
        for &(a, b) in &edges {
            for q in [a, b] {
                if seen.insert(q) {
                    qubits.push(q);
                }
            }
        }
        Self::new(qubits, edges)
    }

    /// A `rows x cols` square lattice with qubit `r * cols + c`.
    pub fn grid(rows: u32, cols: u32) -> Result<Self, GraphError> {
        let qubits: Vec<u32> = (0..rows * cols).collect();
        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let q = r * cols + c;
                if c + 1 < cols {
                    edges.push((q, q + 1));
                }
                if r + 1 < rows {
                    edges.push((q, q + cols));
                }
            }
        }
        Self::new(qubits, edges)
    }

    /// A cycle `0 - 1 - ... - (n-1) - 0`.
    pub fn ring(n: u32) -> Result<Self, GraphError> {
        let qubits: Vec<u32> = (0..n).collect();
        let edges = match n {
            0 | 1 => vec![],
            2 => vec![(0, 1)],
            _ => (0..n).map(|i| (i, (i + 1) % n)).collect(),
        };
        Self::new(qubits, edges)
    }

    /// Attaches fidelity annotations.
    ///
    /// # Errors
    ///
    /// Fails if a series length differs from the qubit or edge count.
    pub fn with_fidelity(mut self, fidelity: Fidelity) -> Result<Self, GraphError> {
        fidelity.validate(self.qubits.len(), self.edges.len())?;
        self.fidelity = fidelity;
        Ok(self)
    }

    fn add_edge(&mut self, (a, b): (u32, u32)) -> Result<(), GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop { qubit: a });
        }
        let pa = self.position_for_edge((a, b), a)?;
        let pb = self.position_for_edge((a, b), b)?;
        if self.adjacency[pa].contains(&b) {
            return Ok(());
        }
        self.edges.push((a, b));
        self.adjacency[pa].push(b);
        self.adjacency[pb].push(a);
        Ok(())
    }

    fn position_for_edge(&self, edge: (u32, u32), qubit: u32) -> Result<usize, GraphError> {
        self.index
            .get(&qubit)
            .copied()
            .ok_or(GraphError::UnknownEdgeEndpoint { edge, qubit })
    }

    fn position(&self, qubit: u32) -> Result<usize, GraphError> {
        self.index
            .get(&qubit)
            .copied()
            .ok_or(GraphError::QubitNotFound { qubit })
    }

    /// Qubits adjacent to `qubit`, in either edge orientation.
    pub fn neighbors(&self, qubit: u32) -> Result<&[u32], GraphError> {
        Ok(&self.adjacency[self.position(qubit)?])
    }

    /// Number of couplings of `qubit`.
    pub fn degree(&self, qubit: u32) -> Result<usize, GraphError> {
        self.neighbors(qubit).map(<[u32]>::len)
    }

    /// All qubit labels in construction order. Stable across calls, so it
    /// can be indexed for uniform random selection.
    pub fn qubits(&self) -> &[u32] {
        &self.qubits
    }

    /// Deduplicated edges in insertion order.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Fidelity annotations.
    pub fn fidelity(&self) -> &Fidelity {
        &self.fidelity
    }

    /// Number of physical qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Whether `qubit` is part of the graph.
    pub fn contains(&self, qubit: u32) -> bool {
        self.index.contains_key(&qubit)
    }

    /// Whether `a` and `b` are directly coupled.
    pub fn has_edge(&self, a: u32, b: u32) -> bool {
        self.index
            .get(&a)
            .is_some_and(|&pa| self.adjacency[pa].contains(&b))
    }

    /// Named single-qubit fidelity of `qubit`, if that series exists.
    pub fn qubit_fidelity(&self, qubit: u32, name: &str) -> Result<Option<f64>, GraphError> {
        let pos = self.position(qubit)?;
        Ok(self.fidelity.single_qubit.get(name).map(|s| s[pos]))
    }

    /// Named two-qubit fidelity of the edge between `a` and `b`.
    ///
    /// Returns `Ok(None)` if the qubits are not coupled or the series is absent.
    pub fn edge_fidelity(&self, a: u32, b: u32, name: &str) -> Result<Option<f64>, GraphError> {
        self.position(a)?;
        self.position(b)?;
        let Some(series) = self.fidelity.two_qubit.get(name) else {
            return Ok(None);
        };
        Ok(self
            .edges
            .iter()
            .position(|&(x, y)| (x == a && y == b) || (x == b && y == a))
            .map(|i| series[i]))
    }

    /// Returns a copy without the listed qubits and every edge touching them.
    ///
    /// Labels not present in the graph are ignored. Fidelity series are
    /// filtered to stay aligned.
    pub fn without_qubits(&self, removed: &[u32]) -> Result<Self, GraphError> {
        let removed: HashSet<u32> = removed.iter().copied().collect();
        let keep_qubit: Vec<bool> = self.qubits.iter().map(|q| !removed.contains(q)).collect();
        let keep_edge: Vec<bool> = self
            .edges
            .iter()
            .map(|(a, b)| !removed.contains(a) && !removed.contains(b))
            .collect();

        let qubits = self
            .qubits
            .iter()
            .zip(&keep_qubit)
            .filter(|(_, keep)| **keep)
            .map(|(&q, _)| q)
            .collect();
        let edges = self
            .edges
            .iter()
            .zip(&keep_edge)
            .filter(|(_, keep)| **keep)
            .map(|(&e, _)| e)
            .collect();

        Self::new(qubits, edges)?.with_fidelity(self.fidelity.retain(&keep_qubit, &keep_edge))
    }

    /// Whether `qubits` induce a connected subgraph. The empty set is connected.
    pub fn is_connected_set(&self, qubits: &[u32]) -> Result<bool, GraphError> {
        let Some(&first) = qubits.first() else {
            return Ok(true);
        };
        let members: HashSet<u32> = qubits.iter().copied().collect();
        for &q in &members {
            self.position(q)?;
        }

        let mut seen = HashSet::from([first]);
        let mut queue = VecDeque::from([first]);
        while let Some(q) = queue.pop_front() {
            for &n in self.neighbors(q)? {
                if members.contains(&n) && seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        Ok(seen.len() == members.len())
    }

    /// Size of the connected component containing `qubit`.
    pub fn component_size(&self, qubit: u32) -> Result<usize, GraphError> {
        self.position(qubit)?;
        let mut seen = HashSet::from([qubit]);
        let mut queue = VecDeque::from([qubit]);
        while let Some(q) = queue.pop_front() {
            for &n in self.neighbors(q)? {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        Ok(seen.len())
    }
}

impl TryFrom<DeviceSpec> for ConnectivityGraph {
    type Error = GraphError;

    fn try_from(spec: DeviceSpec) -> Result<Self, Self::Error> {
        Self::new(spec.qubits, spec.edges)?.with_fidelity(spec.fidelity)
    }
}

impl From<ConnectivityGraph> for DeviceSpec {
    fn from(graph: ConnectivityGraph) -> Self {
        DeviceSpec {
            qubits: graph.qubits,
            edges: graph.edges,
            fidelity: graph.fidelity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> ConnectivityGraph {
        ConnectivityGraph::new(vec![0, 1, 2, 3], vec![(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap()
    }

    #[test]
    fn test_neighbors_undirected() {
        let g = square();
        let mut n0 = g.neighbors(0).unwrap().to_vec();
        n0.sort_unstable();
        assert_eq!(n0, vec![1, 3]);
        let mut n2 = g.neighbors(2).unwrap().to_vec();
        n2.sort_unstable();
        assert_eq!(n2, vec![1, 3]);
    }

    #[test]
    fn test_neighbors_unknown_qubit() {
        let g = square();
        assert_eq!(
            g.neighbors(7).unwrap_err(),
            GraphError::QubitNotFound { qubit: 7 }
        );
    }

    #[test]
    fn test_duplicate_edges_ignored() {
        let g = ConnectivityGraph::new(vec![0, 1], vec![(0, 1), (1, 0), (0, 1)]).unwrap();
        assert_eq!(g.edges().len(), 1);
        assert_eq!(g.degree(0).unwrap(), 1);
    }

    #[test]
    fn test_invalid_construction() {
        assert_eq!(
            ConnectivityGraph::new(vec![], vec![]).unwrap_err(),
            GraphError::Empty
        );
        assert_eq!(
            ConnectivityGraph::new(vec![0, 0], vec![]).unwrap_err(),
            GraphError::DuplicateQubit { qubit: 0 }
        );
        assert_eq!(
            ConnectivityGraph::new(vec![0, 1], vec![(0, 5)]).unwrap_err(),
            GraphError::UnknownEdgeEndpoint {
                edge: (0, 5),
                qubit: 5
            }
        );
        assert_eq!(
            ConnectivityGraph::new(vec![0, 1], vec![(1, 1)]).unwrap_err(),
            GraphError::SelfLoop { qubit: 1 }
        );
    }

    #[test]
    fn test_from_edges_first_seen_order() {
        let g = ConnectivityGraph::from_edges(vec![(5, 1), (1, 9), (9, 5)]).unwrap();
        assert_eq!(g.qubits(), &[5, 1, 9]);
    }

    #[test]
    fn test_grid_shape() {
        let g = ConnectivityGraph::grid(2, 3).unwrap();
        assert_eq!(g.num_qubits(), 6);
        // 2 rows * 2 horizontal + 3 vertical
        assert_eq!(g.edges().len(), 7);
        assert!(g.has_edge(1, 4));
        assert!(!g.has_edge(2, 3));
    }

    #[test]
    fn test_fidelity_lookup() {
        let g = square()
            .with_fidelity(
                Fidelity::new()
                    .with_single_qubit("f1QRB", vec![0.99, 0.98, 0.97, 0.96])
                    .with_two_qubit("fCZ", vec![0.9, 0.8, 0.7, 0.6]),
            )
            .unwrap();
        assert_eq!(g.qubit_fidelity(2, "f1QRB").unwrap(), Some(0.97));
        assert_eq!(g.qubit_fidelity(2, "fRO").unwrap(), None);
        assert_eq!(g.edge_fidelity(0, 3, "fCZ").unwrap(), Some(0.6));
        assert_eq!(g.edge_fidelity(3, 0, "fCZ").unwrap(), Some(0.6));
        assert_eq!(g.edge_fidelity(0, 2, "fCZ").unwrap(), None);
        assert!(g.edge_fidelity(0, 8, "fCZ").is_err());
    }

    #[test]
    fn test_fidelity_length_checked() {
        let err = square()
            .with_fidelity(Fidelity::new().with_two_qubit("fCZ", vec![0.9]))
            .unwrap_err();
        assert!(matches!(err, GraphError::FidelityLengthMismatch { .. }));
    }

    #[test]
    fn test_without_qubits() {
        let g = square()
            .with_fidelity(
                Fidelity::new()
                    .with_single_qubit("fRO", vec![0.1, 0.2, 0.3, 0.4])
                    .with_two_qubit("fCZ", vec![0.5, 0.6, 0.7, 0.8]),
            )
            .unwrap();
        let pruned = g.without_qubits(&[1, 42]).unwrap();
        assert_eq!(pruned.qubits(), &[0, 2, 3]);
        assert_eq!(pruned.edges(), &[(2, 3), (3, 0)]);
        assert_eq!(pruned.fidelity().single_qubit["fRO"], vec![0.1, 0.3, 0.4]);
        assert_eq!(pruned.fidelity().two_qubit["fCZ"], vec![0.7, 0.8]);
        assert!(pruned.neighbors(0).unwrap().contains(&3));
        assert!(!pruned.contains(1));
    }

    #[test]
    fn test_connected_set_and_component() {
        let g = ConnectivityGraph::new(vec![0, 1, 2, 3, 4], vec![(0, 1), (1, 2), (3, 4)]).unwrap();
        assert!(g.is_connected_set(&[0, 1, 2]).unwrap());
        assert!(!g.is_connected_set(&[0, 2]).unwrap());
        assert!(g.is_connected_set(&[]).unwrap());
        assert_eq!(g.component_size(0).unwrap(), 3);
        assert_eq!(g.component_size(4).unwrap(), 2);
    }

    #[test]
    fn test_device_spec_roundtrip() {
        let spec = DeviceSpec {
            qubits: vec![0, 1, 2],
            edges: vec![(0, 1), (1, 2)],
            fidelity: Fidelity::default(),
        };
        let g = ConnectivityGraph::try_from(spec.clone()).unwrap();
        assert_eq!(DeviceSpec::from(g), spec);
    }
}
