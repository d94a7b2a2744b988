//! Exhaustive linear scan. Always permitted for every metric.

use std::collections::HashMap;

use rayon::prelude::*;

use super::{finalize_top_k, matches_filter};
use crate::metric;
use crate::model::{Chunk, ChunkId, Metric};

pub struct LinearIndex {
    entries: Vec<(ChunkId, Vec<f32>)>,
}

impl LinearIndex {
    pub fn build(chunks: &[&Chunk]) -> Self {
        let entries = chunks
            .iter()
            .map(|c| (c.id.clone(), c.embedding.clone()))
            .collect();
        Self { entries }
    }

    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        metric: Metric,
        chunks: &HashMap<ChunkId, Chunk>,
        filter: &HashMap<String, String>,
        seqs: &HashMap<ChunkId, u64>,
    ) -> Vec<(ChunkId, f32)> {
        // Exhaustive scan is embarrassingly parallel across chunks.
        let scored: Vec<(ChunkId, f32)> = self
            .entries
            .par_iter()
            .filter(|(id, _)| {
                chunks
                    .get(id)
                    .map(|c| filter.is_empty() || matches_filter(c, filter))
                    .unwrap_or(false)
            })
            .map(|(id, emb)| (id.clone(), metric::score(metric, query, emb)))
            .collect();
        finalize_top_k(scored, k, seqs)
    }
}
