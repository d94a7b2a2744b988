//! Random-hyperplane LSH. Cosine only.

use std::collections::{HashMap, HashSet};

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{finalize_top_k, matches_filter};
use crate::metric::{cosine, dot, l2_norm};
use crate::model::{Chunk, ChunkId, LshParams};

type Signature = Vec<u64>;

struct Table {
    planes: Vec<Vec<f32>>,
    buckets: HashMap<Signature, Vec<ChunkId>>,
}

pub struct LshIndex {
    tables: Vec<Table>,
    num_planes: usize,
}

impl LshIndex {
    /// Draws all `L * P` hyperplanes from a single seeded stream (table 0's
    /// planes before table 1's, etc.) so the whole build is reproducible
    /// from `(seed, num_tables, num_planes)` alone.
    pub fn build(chunks: &[&Chunk], params: LshParams) -> Self {
        let dim = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(params.seed);

        let tables = (0..params.num_tables)
            .map(|_| {
                let planes: Vec<Vec<f32>> = (0..params.num_planes)
                    .map(|_| random_unit_vector(&mut rng, dim))
                    .collect();
                let mut buckets: HashMap<Signature, Vec<ChunkId>> = HashMap::new();
                for chunk in chunks {
                    let sig = signature(&chunk.embedding, &planes);
                    buckets.entry(sig).or_default().push(chunk.id.clone());
                }
                Table { planes, buckets }
            })
            .collect();

        Self {
            tables,
            num_planes: params.num_planes,
        }
    }

    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        chunks: &HashMap<ChunkId, Chunk>,
        filter: &HashMap<String, String>,
        seqs: &HashMap<ChunkId, u64>,
    ) -> Vec<(ChunkId, f32)> {
        let mut candidates: HashSet<ChunkId> = HashSet::new();
        let query_sigs: Vec<Signature> = self
            .tables
            .iter()
            .map(|t| signature(query, &t.planes))
            .collect();

        for (table, sig) in self.tables.iter().zip(query_sigs.iter()) {
            if let Some(bucket) = table.buckets.get(sig) {
                candidates.extend(bucket.iter().cloned());
            }
        }

        if candidates.is_empty() {
            let mut bit = 0;
            while candidates.is_empty() && bit < self.num_planes {
                for (table, sig) in self.tables.iter().zip(query_sigs.iter()) {
                    let flipped = flip_bit(sig, bit);
                    if let Some(bucket) = table.buckets.get(&flipped) {
                        candidates.extend(bucket.iter().cloned());
                    }
                }
                bit += 1;
            }
        }

        if candidates.is_empty() {
            candidates.extend(chunks.keys().cloned());
        }

        // Re-rank by exact cosine similarity first, then filter, then top-k.
        let scored: Vec<(ChunkId, f32)> = candidates
            .into_iter()
            .filter_map(|id| {
                chunks.get(&id).and_then(|c| {
                    let keep = filter.is_empty() || matches_filter(c, filter);
                    keep.then(|| (id, cosine(query, &c.embedding)))
                })
            })
            .collect();

        finalize_top_k(scored, k, seqs)
    }
}

fn signature(v: &[f32], planes: &[Vec<f32>]) -> Signature {
    let mut words = vec![0u64; planes.len().div_ceil(64)];
    for (i, plane) in planes.iter().enumerate() {
        if dot(v, plane) >= 0.0 {
            words[i / 64] |= 1 << (i % 64);
        }
    }
    words
}

fn flip_bit(sig: &Signature, bit: usize) -> Signature {
    let mut flipped = sig.clone();
    flipped[bit / 64] ^= 1 << (bit % 64);
    flipped
}

/// A random unit vector via Box–Muller Gaussians, normalized. Hand-rolled
/// rather than pulled in from a distribution crate — a few lines, no need
/// for a one-off dependency.
fn random_unit_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    let mut v: Vec<f32> = (0..dim).map(|_| gaussian(rng)).collect();
    let norm = l2_norm(&v);
    if norm > 1e-10 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

fn gaussian(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.gen::<f32>().max(1e-10);
    let u2: f32 = rng.gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentId, LibraryId};
    use chrono::Utc;

    fn make_chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: ChunkId(id.to_string()),
            library_id: LibraryId::new(),
            document_id: DocumentId::new(),
            text: format!("chunk {id}"),
            embedding,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn scenario_lsh_cosine() {
        let a = make_chunk("a", vec![0.0, 1.0, 0.0]);
        let b = make_chunk("b", vec![1.0, 0.0, 0.0]);
        let refs = vec![&a, &b];
        let params = LshParams {
            num_tables: 4,
            num_planes: 16,
            seed: 42,
        };
        let idx = LshIndex::build(&refs, params);
        let map: HashMap<ChunkId, Chunk> = refs.iter().map(|c| (c.id.clone(), (*c).clone())).collect();
        let seqs: HashMap<ChunkId, u64> = [(a.id.clone(), 0), (b.id.clone(), 1)].into_iter().collect();
        let result = idx.search(&[1.0, 0.0, 0.0], 1, &map, &HashMap::new(), &seqs);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, b.id);
    }

    #[test]
    fn empty_buckets_fall_back_to_full_library() {
        let a = make_chunk("a", vec![0.3, 0.4, 0.866]);
        let refs = vec![&a];
        let params = LshParams {
            num_tables: 2,
            num_planes: 8,
            seed: 1,
        };
        let idx = LshIndex::build(&refs, params);
        let map: HashMap<ChunkId, Chunk> = refs.iter().map(|c| (c.id.clone(), (*c).clone())).collect();
        let seqs: HashMap<ChunkId, u64> = [(a.id.clone(), 0)].into_iter().collect();
        let result = idx.search(&[-1.0, -1.0, -1.0], 1, &map, &HashMap::new(), &seqs);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, a.id);
    }

    #[test]
    fn reproducible_from_same_seed() {
        let a = make_chunk("a", vec![0.0, 1.0, 0.0]);
        let b = make_chunk("b", vec![1.0, 0.0, 0.0]);
        let refs = vec![&a, &b];
        let params = LshParams {
            num_tables: 3,
            num_planes: 10,
            seed: 99,
        };
        let idx1 = LshIndex::build(&refs, params);
        let idx2 = LshIndex::build(&refs, params);
        let map: HashMap<ChunkId, Chunk> = refs.iter().map(|c| (c.id.clone(), (*c).clone())).collect();
        let seqs: HashMap<ChunkId, u64> = [(a.id.clone(), 0), (b.id.clone(), 1)].into_iter().collect();
        let r1 = idx1.search(&[1.0, 0.0, 0.0], 1, &map, &HashMap::new(), &seqs);
        let r2 = idx2.search(&[1.0, 0.0, 0.0], 1, &map, &HashMap::new(), &seqs);
        assert_eq!(r1[0].0, r2[0].0);
    }
}
