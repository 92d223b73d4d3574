//! Perturbation of embeddings.
//!
//! A perturbation proposes the next candidate in the search. The basic
//! step flips a fair coin: either grow a structurally new connected
//! subgraph from a random member of the current embedding, or reorder the
//! current qubits among the logical slots. Chained variants apply several
//! steps per proposal.

mod operators;
mod types;

pub use operators::{partial_shuffle, perturb, perturb_chain, regenerate, reorder};
pub use types::{Perturbation, MAX_CHAIN};
