//! KD-tree, axis-aligned binary partition. Euclidean only.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::{finalize_top_k, matches_filter};
use crate::metric::euclidean;
use crate::model::{Chunk, ChunkId};

const LEAF_THRESHOLD: usize = 8;

enum KdNode {
    Leaf(Vec<(ChunkId, Vec<f32>)>),
    Internal {
        axis: usize,
        split: f32,
        less: Box<KdNode>,
        ge: Box<KdNode>,
    },
}

pub struct KdTreeIndex {
    root: KdNode,
}

impl KdTreeIndex {
    pub fn build(chunks: &[&Chunk]) -> Self {
        let points: Vec<(ChunkId, Vec<f32>)> = chunks
            .iter()
            .map(|c| (c.id.clone(), c.embedding.clone()))
            .collect();
        Self {
            root: build_node(points),
        }
    }

    /// Best-first k-NN: descend to a leaf pushing each sibling onto a
    /// min-priority queue keyed by perpendicular distance to its split
    /// plane, then keep popping the closest pending subtree while it could
    /// still improve on the current k-th best distance.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        chunks: &HashMap<ChunkId, Chunk>,
        filter: &HashMap<String, String>,
        seqs: &HashMap<ChunkId, u64>,
    ) -> Vec<(ChunkId, f32)> {
        let mut best: BinaryHeap<HeapEntry> = BinaryHeap::new();
        let mut pending: BinaryHeap<PendingEntry> = BinaryHeap::new();
        pending.push(PendingEntry {
            neg_plane_dist: 0.0,
            node: &self.root,
        });

        while let Some(PendingEntry { neg_plane_dist, node }) = pending.pop() {
            let plane_dist = -neg_plane_dist;
            if best.len() == k {
                if let Some(worst) = best.peek() {
                    if plane_dist > worst.dist {
                        break;
                    }
                }
            }

            let mut cur = node;
            loop {
                match cur {
                    KdNode::Leaf(points) => {
                        for (id, emb) in points {
                            let keep = chunks
                                .get(id)
                                .map(|c| filter.is_empty() || matches_filter(c, filter))
                                .unwrap_or(false);
                            if !keep {
                                continue;
                            }
                            let dist = euclidean(query, emb);
                            push_bounded(&mut best, k, id.clone(), dist);
                        }
                        break;
                    }
                    KdNode::Internal { axis, split, less, ge } => {
                        let diff = query[*axis] - split;
                        let (near, far) = if diff < 0.0 {
                            (less.as_ref(), ge.as_ref())
                        } else {
                            (ge.as_ref(), less.as_ref())
                        };
                        pending.push(PendingEntry {
                            neg_plane_dist: -diff.abs(),
                            node: far,
                        });
                        cur = near;
                    }
                }
            }
        }

        let scored: Vec<(ChunkId, f32)> = best.into_iter().map(|e| (e.id, -e.dist)).collect();
        finalize_top_k(scored, k, seqs)
    }
}

fn push_bounded(heap: &mut BinaryHeap<HeapEntry>, k: usize, id: ChunkId, dist: f32) {
    if heap.len() < k {
        heap.push(HeapEntry { dist, id });
    } else if let Some(worst) = heap.peek() {
        if dist < worst.dist {
            heap.pop();
            heap.push(HeapEntry { dist, id });
        }
    }
}

fn build_node(mut points: Vec<(ChunkId, Vec<f32>)>) -> KdNode {
    if points.len() <= LEAF_THRESHOLD || points.is_empty() {
        return KdNode::Leaf(points);
    }
    let dim = points[0].1.len();
    let axis = max_variance_axis(&points, dim);
    points.sort_by(|a, b| a.1[axis].partial_cmp(&b.1[axis]).unwrap_or(Ordering::Equal));
    let mid = points.len() / 2;
    let split = points[mid].1[axis];
    let ge_points = points.split_off(mid);
    KdNode::Internal {
        axis,
        split,
        less: Box::new(build_node(points)),
        ge: Box::new(build_node(ge_points)),
    }
}

fn max_variance_axis(points: &[(ChunkId, Vec<f32>)], dim: usize) -> usize {
    let n = points.len() as f32;
    let mut mean = vec![0.0f32; dim];
    for (_, emb) in points {
        for d in 0..dim {
            mean[d] += emb[d];
        }
    }
    for m in mean.iter_mut() {
        *m /= n;
    }
    let mut variance = vec![0.0f32; dim];
    for (_, emb) in points {
        for d in 0..dim {
            let diff = emb[d] - mean[d];
            variance[d] += diff * diff;
        }
    }
    variance
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Max-heap entry: largest distance on top, so the worst of the current
/// best-k is what gets evicted first.
struct HeapEntry {
    dist: f32,
    id: ChunkId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.partial_cmp(&other.dist).unwrap_or(Ordering::Equal)
    }
}

/// Min-heap entry via negated distance (`BinaryHeap` is max-first).
struct PendingEntry<'a> {
    neg_plane_dist: f32,
    node: &'a KdNode,
}

impl PartialEq for PendingEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.neg_plane_dist == other.neg_plane_dist
    }
}
impl Eq for PendingEntry<'_> {}
impl PartialOrd for PendingEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for PendingEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.neg_plane_dist
            .partial_cmp(&other.neg_plane_dist)
            .unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentId, LibraryId};
    use chrono::Utc;
    use rand::{rngs::StdRng, Rng, SeedableRng};

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
    fn matches_linear_scan_exactly() {
        let mut rng = StdRng::seed_from_u64(7);
        let chunks: Vec<Chunk> = (0..200)
            .map(|i| {
                let v: Vec<f32> = (0..6).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();
                make_chunk(&format!("c{i}"), v)
            })
            .collect();
        let refs: Vec<&Chunk> = chunks.iter().collect();
        let idx = KdTreeIndex::build(&refs);
        let map: HashMap<ChunkId, Chunk> = refs.iter().map(|c| (c.id.clone(), (*c).clone())).collect();
        let seqs: HashMap<ChunkId, u64> = refs
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i as u64))
            .collect();

        let query: Vec<f32> = (0..6).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();
        let kd_result = idx.search(&query, 5, &map, &HashMap::new(), &seqs);

        let brute: Vec<(ChunkId, f32)> = chunks
            .iter()
            .map(|c| (c.id.clone(), -euclidean(&query, &c.embedding)))
            .collect();
        let brute_top = finalize_top_k(brute, 5, &seqs);

        let kd_ids: Vec<&ChunkId> = kd_result.iter().map(|(id, _)| id).collect();
        let brute_ids: Vec<&ChunkId> = brute_top.iter().map(|(id, _)| id).collect();
        assert_eq!(kd_ids, brute_ids);
    }

    #[test]
    fn scenario_two_chunks() {
        let a = make_chunk("a", vec![0.0, 1.0, 0.0]);
        let b = make_chunk("b", vec![1.0, 0.0, 0.0]);
        let refs = vec![&a, &b];
        let idx = KdTreeIndex::build(&refs);
        let map: HashMap<ChunkId, Chunk> = refs.iter().map(|c| (c.id.clone(), (*c).clone())).collect();
        let seqs: HashMap<ChunkId, u64> = [(a.id.clone(), 0), (b.id.clone(), 1)].into_iter().collect();
        let result = idx.search(&[0.1, 0.9, 0.0], 2, &map, &HashMap::new(), &seqs);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].0, a.id);
        assert_eq!(result[1].0, b.id);
    }
}
