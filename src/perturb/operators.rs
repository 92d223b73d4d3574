//! Embedding perturbation operators.
//!
//! Every operator maps an embedding to a new embedding of the same length
//! with distinct qubits. Inputs are never modified.
//!
//! # Operators
//!
//! - [`regenerate`]: grow a fresh connected subgraph from a random member
//! - [`reorder`]: random permutation of the slots, same physical qubits
//! - [`partial_shuffle`]: permute only a random subset of the slots
//! - [`perturb`]: fair coin between [`regenerate`] and [`reorder`]
//! - [`perturb_chain`]: `k` successive [`perturb`] steps

use rand::seq::SliceRandom;
use rand::Rng;

use crate::embedding::Embedding;
use crate::error::SubgraphError;
use crate::graph::ConnectivityGraph;
use crate::subgraph::SubgraphGenerator;

/// Random reordering of the embedding's slots.
///
/// The physical qubit set is unchanged; only the logical-to-physical
/// correspondence moves.
pub fn reorder<R: Rng>(embedding: &Embedding, rng: &mut R) -> Embedding {
    let mut qubits = embedding.as_slice().to_vec();
    qubits.shuffle(rng);
    Embedding::from_distinct(qubits)
}

/// Shuffles a random subset of slots among themselves.
///
/// Each slot joins the shuffle pool with probability `1 - keep_probability`;
/// pooled qubits are permuted and written back to the pooled slots.
/// `keep_probability >= 1` returns the embedding unchanged.
pub fn partial_shuffle<R: Rng>(
    embedding: &Embedding,
    keep_probability: f64,
    rng: &mut R,
) -> Embedding {
    let mut qubits = embedding.as_slice().to_vec();
    if keep_probability >= 1.0 {
        return Embedding::from_distinct(qubits);
    }

    let slots: Vec<usize> = (0..qubits.len())
        .filter(|_| rng.random::<f64>() >= keep_probability)
        .collect();
    let mut pool: Vec<u32> = slots.iter().map(|&i| qubits[i]).collect();
    pool.shuffle(rng);
    for (&slot, q) in slots.iter().zip(pool) {
        qubits[slot] = q;
    }
    Embedding::from_distinct(qubits)
}

/// Grows a new connected subgraph of the same size from a random member of
/// `embedding`.
///
/// Returns `Ok(None)` when the member's component is too small to supply
/// `embedding.len()` qubits (only possible for disconnected embeddings).
///
/// # Errors
///
/// Fails if a member of `embedding` is not in `graph`.
pub fn regenerate<R: Rng>(
    graph: &ConnectivityGraph,
    embedding: &Embedding,
    rng: &mut R,
) -> Result<Option<Embedding>, SubgraphError> {
    if embedding.is_empty() {
        return Ok(Some(embedding.clone()));
    }
    let start = embedding.as_slice()[rng.random_range(0..embedding.len())];
    let generator = SubgraphGenerator::new(graph, embedding.len())?;
    let candidate = generator.from_start(start, rng)?;
    Ok((candidate.len() == embedding.len()).then_some(candidate))
}

/// One perturbation step.
///
/// Draws `u` uniform in `[0, 1)`. If `u > 0.5` the embedding is
/// [regenerated](regenerate) from a random member, otherwise it is
/// [reordered](reorder). A regeneration that comes up short falls back to
/// a reordering so the length is always preserved.
pub fn perturb<R: Rng>(
    graph: &ConnectivityGraph,
    embedding: &Embedding,
    rng: &mut R,
) -> Result<Embedding, SubgraphError> {
    let u: f64 = rng.random();
    if u > 0.5 {
        if let Some(candidate) = regenerate(graph, embedding, rng)? {
            return Ok(candidate);
        }
    }
    Ok(reorder(embedding, rng))
}

/// Applies [`perturb`] `k` times, each step feeding the next.
/// `k == 0` returns a copy of the input.
pub fn perturb_chain<R: Rng>(
    graph: &ConnectivityGraph,
    embedding: &Embedding,
    k: usize,
    rng: &mut R,
) -> Result<Embedding, SubgraphError> {
    let mut out = embedding.clone();
    for _ in 0..k {
        out = perturb(graph, &out, rng)?;
    }
    Ok(out)
}
