//! Perturbation scheme selection.

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::operators::{partial_shuffle, perturb, perturb_chain};
use crate::embedding::Embedding;
use crate::error::{ConfigError, SubgraphError};
use crate::graph::ConnectivityGraph;

/// Longest supported perturbation chain.
pub const MAX_CHAIN: usize = 4;

/// How the annealer proposes the next candidate embedding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Perturbation {
    /// One regenerate-or-reorder step.
    #[default]
    Single,

    /// `k` chained steps, `k` in `1..=4`. Larger `k` moves further per
    /// proposal and escapes local structure faster.
    Chain(usize),

    /// Shuffle a random subset of slots. Never changes the qubit set.
    PartialShuffle {
        /// Probability that a slot keeps its qubit, in `[0, 1]`.
        keep_probability: f64,
    },
}

impl Perturbation {
    /// Produces a candidate from `embedding`.
    pub fn apply<R: Rng>(
        &self,
        graph: &ConnectivityGraph,
        embedding: &Embedding,
        rng: &mut R,
    ) -> Result<Embedding, SubgraphError> {
        match *self {
            Perturbation::Single => perturb(graph, embedding, rng),
            Perturbation::Chain(k) => perturb_chain(graph, embedding, k, rng),
            Perturbation::PartialShuffle { keep_probability } => {
                Ok(partial_shuffle(embedding, keep_probability, rng))
            }
        }
    }

    /// Checks the scheme's parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Perturbation::Single => Ok(()),
            Perturbation::Chain(k) if (1..=MAX_CHAIN).contains(&k) => Ok(()),
            Perturbation::Chain(k) => Err(ConfigError::InvalidChainLength(k)),
            Perturbation::PartialShuffle { keep_probability }
                if (0.0..=1.0).contains(&keep_probability) =>
            {
                Ok(())
            }
            Perturbation::PartialShuffle { keep_probability } => {
                Err(ConfigError::InvalidKeepProbability(keep_probability))
            }
        }
    }

    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match *self {
            Perturbation::Single => "single",
            Perturbation::Chain(2) => "chain-2",
            Perturbation::Chain(3) => "chain-3",
            Perturbation::Chain(4) => "chain-4",
            Perturbation::Chain(_) => "chain",
            Perturbation::PartialShuffle { .. } => "partial-shuffle",
        }
    }
}
