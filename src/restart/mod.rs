//! Random-restart search over embeddings.
//!
//! A cheaper alternative to annealing when the device is small: score a
//! batch of uniformly random embeddings (no connectivity requirement), keep
//! the best, then try partial shuffles of it. Each refinement lowers the
//! probability that a slot keeps its qubit, so the moves grow from small
//! swaps to near-complete reorderings. The qubit set found by sampling is
//! never changed by refinement.

mod config;
mod runner;

pub use config::RestartConfig;
pub use runner::{RestartEntry, RestartResult, RestartRunner, RestartStage, RestartStop};
