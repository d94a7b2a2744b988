//! Index: a sum type over the three algorithms, dispatching at the
//! registry boundary rather than through a class hierarchy.

pub mod kdtree;
pub mod linear;
pub mod lsh;

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{Chunk, ChunkId, Metric};

/// Equality-map metadata predicate — AND-of-equals only, no ranges or
/// negation.
pub fn matches_filter(chunk: &Chunk, filter: &HashMap<String, String>) -> bool {
    filter
        .iter()
        .all(|(k, v)| chunk.metadata.get(k).map(|actual| actual == v).unwrap_or(false))
}

/// Chunk id lexicographic ascending, then insertion order ascending. Chunk
/// ids are globally unique, so the id comparison always discriminates in
/// practice; the sequence comparison is kept so the contract holds even if
/// that uniqueness were ever relaxed.
pub fn tie_break_key<'a>(id: &'a ChunkId, seq: u64) -> (&'a str, u64) {
    (id.as_ref(), seq)
}

/// Sort `(id, score)` pairs best-first under `metric`'s score (higher
/// first), tie-broken per [`tie_break_key`], then truncate to `k`.
pub fn finalize_top_k(
    mut scored: Vec<(ChunkId, f32)>,
    k: usize,
    seqs: &HashMap<ChunkId, u64>,
) -> Vec<(ChunkId, f32)> {
    scored.sort_by(|(a_id, a_score), (b_id, b_score)| {
        b_score
            .partial_cmp(a_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let a_seq = seqs.get(a_id).copied().unwrap_or(u64::MAX);
                let b_seq = seqs.get(b_id).copied().unwrap_or(u64::MAX);
                tie_break_key(a_id, a_seq).cmp(&tie_break_key(b_id, b_seq))
            })
    });
    scored.truncate(k);
    scored
}

/// Materialised index for one library. Each variant holds its own copy of
/// whatever it needs to answer queries without reaching back into the
/// store, except LSH's bucket contents (chunk ids only — rerank looks up
/// embeddings from the library's chunk map under the same lock).
pub enum Index {
    Linear(linear::LinearIndex),
    KdTree(kdtree::KdTreeIndex),
    Lsh(lsh::LshIndex),
}

impl Index {
    /// Validate `(algorithm, metric)` compatibility, then build.
    pub fn build(
        algorithm: crate::model::Algorithm,
        metric: Metric,
        chunks: &[&Chunk],
        lsh_params: Option<crate::model::LshParams>,
    ) -> Result<Self> {
        use crate::model::Algorithm as A;
        match (algorithm, metric) {
            (A::KdTree, m) if m != Metric::Euclidean => {
                Err(Error::InvalidAlgorithmMetric { algorithm, metric })
            }
            (A::Lsh, m) if m != Metric::Cosine => {
                Err(Error::InvalidAlgorithmMetric { algorithm, metric })
            }
            (A::Linear, _) => Ok(Index::Linear(linear::LinearIndex::build(chunks))),
            (A::KdTree, _) => Ok(Index::KdTree(kdtree::KdTreeIndex::build(chunks))),
            (A::Lsh, _) => {
                let params = lsh_params.unwrap_or(crate::model::LshParams {
                    num_tables: 4,
                    num_planes: 16,
                    seed: 0,
                });
                Ok(Index::Lsh(lsh::LshIndex::build(chunks, params)))
            }
        }
    }

    /// Search for the top-k candidates matching `filter`, scored under
    /// `metric`. `chunks` is the library's live chunk map, used for
    /// metadata lookups (all variants) and embedding rerank (LSH only).
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        metric: Metric,
        chunks: &HashMap<ChunkId, Chunk>,
        filter: &HashMap<String, String>,
        seqs: &HashMap<ChunkId, u64>,
    ) -> Vec<(ChunkId, f32)> {
        match self {
            Index::Linear(idx) => idx.search(query, k, metric, chunks, filter, seqs),
            Index::KdTree(idx) => idx.search(query, k, chunks, filter, seqs),
            Index::Lsh(idx) => idx.search(query, k, chunks, filter, seqs),
        }
    }
}
