//! Connected-subgraph candidate generation.
//!
//! Candidates for an embedding are connected sets of physical qubits, so
//! that the compiled circuit needs few routing operations between them.
//! [`SubgraphGenerator`] grows such sets by a randomized depth-first
//! traversal that stops once the requested number of qubits is visited.

mod generator;

pub use generator::SubgraphGenerator;
