//! Hardware-aware qubit embedding search.
//!
//! Chooses where the logical qubits of a small circuit live on a device's
//! physical qubits, so that compiling the circuit there needs as little
//! routing as possible. The cost of a placement is only available through
//! an external compiler, so the search is a heuristic:
//!
//! - **Connectivity graph** ([`graph`]): physical qubits, their undirected
//!   couplings and fidelity annotations.
//! - **Subgraph generation** ([`subgraph`]): connected candidate qubit sets
//!   grown by randomized depth-first traversal.
//! - **Perturbation** ([`perturb`]): regenerate-or-reorder moves, single or
//!   chained.
//! - **Objective** ([`objective`]): the black-box cost boundary, separating
//!   transient evaluation failures from fatal ones.
//! - **Annealing** ([`anneal`]): exponential temperature schedule with
//!   Metropolis acceptance, best-so-far tracking and a full trace.
//! - **Random restart** ([`restart`]): best of a batch of random
//!   placements, refined by partial shuffles of shrinking keep probability.
//!
//! # Example
//!
//! ```
//! use u_embed::anneal::{AnnealConfig, AnnealRunner};
//! use u_embed::graph::ConnectivityGraph;
//! use u_embed::{Embedding, ObjectiveError};
//!
//! let graph = ConnectivityGraph::grid(4, 5).unwrap();
//! let config = AnnealConfig::default().with_max_iterations(200).with_seed(7);
//!
//! // Stand-in for a compiler: prefer low-numbered qubits.
//! let cost = |e: &Embedding| -> Result<f64, ObjectiveError> {
//!     Ok(e.iter().map(f64::from).sum())
//! };
//!
//! let result = AnnealRunner::run_random_start(&graph, &config, 4, cost).unwrap();
//! assert_eq!(result.best_embedding.len(), 4);
//! assert!(result.best_cost <= result.initial_cost);
//! ```
//!
//! # Architecture
//!
//! This crate sits beside `u-metaheur` at Layer 2 (Algorithms) of the
//! U-Engine ecosystem. Circuit models, device-file parsing and compilers
//! live with consumers; the search only sees the [`graph::DeviceSpec`]
//! shape and the [`objective::Objective`] trait.

pub mod anneal;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod objective;
pub mod perturb;
pub mod restart;
pub mod subgraph;

pub use embedding::Embedding;
pub use error::{AnnealError, ConfigError, GraphError, ObjectiveError, Result, SubgraphError};
