//! Cost evaluation boundary.
//!
//! The search treats the cost function as a black box, usually a remote
//! compiler. [`Objective`] is the user-facing trait; [`ObjectiveAdapter`]
//! is what the annealer actually calls, separating transient failures
//! (candidate discarded, search continues) from fatal ones.

mod adapter;
mod types;

pub use adapter::ObjectiveAdapter;
pub use types::{MetricsObjective, Objective, RoutingMetrics};
