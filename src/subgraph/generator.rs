//! Randomized depth-first subgraph generation.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::embedding::Embedding;
use crate::error::{GraphError, SubgraphError};
use crate::graph::ConnectivityGraph;

/// Grows connected qubit sets of a fixed size over a [`ConnectivityGraph`].
///
/// # Examples
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use u_embed::graph::ConnectivityGraph;
/// use u_embed::subgraph::SubgraphGenerator;
///
/// let graph = ConnectivityGraph::ring(4).unwrap();
/// let generator = SubgraphGenerator::new(&graph, 3).unwrap();
/// let mut rng = StdRng::seed_from_u64(1);
///
/// let sub = generator.from_start(0, &mut rng).unwrap();
/// assert_eq!(sub.len(), 3);
/// assert_eq!(sub.physical(0), Some(0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SubgraphGenerator<'g> {
    graph: &'g ConnectivityGraph,
    target_size: usize,
}

impl<'g> SubgraphGenerator<'g> {
    /// Creates a generator for subgraphs of `target_size` qubits.
    pub fn new(graph: &'g ConnectivityGraph, target_size: usize) -> Result<Self, SubgraphError> {
        if target_size == 0 {
            return Err(SubgraphError::ZeroTarget);
        }
        Ok(Self { graph, target_size })
    }

    /// The graph being traversed.
    pub fn graph(&self) -> &'g ConnectivityGraph {
        self.graph
    }

    /// Requested subgraph size.
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Same generator with another target size.
    pub fn with_target_size(self, target_size: usize) -> Result<Self, SubgraphError> {
        Self::new(self.graph, target_size)
    }

    /// Depth-first traversal from `start`, in visitation order.
    ///
    /// Neighbors are expanded in random order. The traversal stops as soon
    /// as `target_size` qubits are visited. If the component containing
    /// `start` is smaller, the result is shorter than requested; that is a
    /// valid outcome, not an error.
    ///
    /// # Errors
    ///
    /// Fails with a graph lookup error if `start` is not in the graph.
    pub fn from_start<R: Rng>(&self, start: u32, rng: &mut R) -> Result<Embedding, SubgraphError> {
        if !self.graph.contains(start) {
            return Err(GraphError::QubitNotFound { qubit: start }.into());
        }

        let mut visited: Vec<u32> = Vec::with_capacity(self.target_size);
        let mut stack = vec![start];
        let mut remaining = self.target_size;

        while remaining > 0 {
            let Some(q) = stack.pop() else { break };
            if visited.contains(&q) {
                continue;
            }
            visited.push(q);
            remaining -= 1;

            let mut next: Vec<u32> = self
                .graph
                .neighbors(q)?
                .iter()
                .copied()
                .filter(|n| !visited.contains(n))
                .collect();
            next.shuffle(rng);
            // Reverse push so the first shuffled neighbor is expanded first.
            stack.extend(next.into_iter().rev());
        }

        Ok(Embedding::from_distinct(visited))
    }

    /// [`from_start`](Self::from_start) from a uniformly random qubit.
    pub fn from_random_start<R: Rng>(&self, rng: &mut R) -> Result<Embedding, SubgraphError> {
        let qubits = self.graph.qubits();
        let start = qubits[rng.random_range(0..qubits.len())];
        self.from_start(start, rng)
    }

    /// Like [`from_start`](Self::from_start) but requires a full-size result.
    ///
    /// # Errors
    ///
    /// [`SubgraphError::ComponentTooSmall`] if the traversal ends early.
    pub fn connected_from_start<R: Rng>(
        &self,
        start: u32,
        rng: &mut R,
    ) -> Result<Embedding, SubgraphError> {
        let sub = self.from_start(start, rng)?;
        if sub.len() < self.target_size {
            return Err(SubgraphError::ComponentTooSmall {
                start,
                target: self.target_size,
                reached: sub.len(),
            });
        }
        Ok(sub)
    }

    /// A full-size connected subgraph from a random start, retrying other
    /// starts until one lies in a large enough component.
    ///
    /// Every qubit is tried at most once, in random order.
    pub fn connected_from_random_start<R: Rng>(
        &self,
        rng: &mut R,
    ) -> Result<Embedding, SubgraphError> {
        let mut starts = self.graph.qubits().to_vec();
        starts.shuffle(rng);
        let attempts = starts.len();

        for start in starts {
            match self.connected_from_start(start, rng) {
                Ok(sub) => return Ok(sub),
                Err(SubgraphError::ComponentTooSmall { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(SubgraphError::NoConnectedSubgraph {
            target: self.target_size,
            attempts,
        })
    }
}
