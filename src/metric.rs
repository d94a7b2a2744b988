//! Distance metrics. Operates on equal-length `&[f32]`.
//!
//! Chunk embeddings come in whatever dimension the first chunk of a library
//! fixes, so these stay safe, auto-vectorizable iterator chains rather than
//! a hand-unrolled unsafe loop pinned to one dimension — that kind of
//! unrolling earns its keep only when the dimension and hot-loop trip count
//! are both fixed and huge, which isn't the shape of a metadata-filtered
//! k-NN scan over a handful of thousand chunks.

use crate::model::Metric;

/// `dot(a,b) / (||a|| * ||b||)`. Zero if either vector has zero norm.
#[inline]
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let na = l2_norm(a);
    let nb = l2_norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}

/// `sqrt(sum((a_i - b_i)^2))`.
#[inline]
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// `sum(a_i * b_i)`.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Ranking score under `metric`: higher is always better. Cosine and dot
/// are used as-is; Euclidean is negated so "closer" still means "higher".
#[inline]
pub fn score(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Metric::Cosine => cosine(a, b),
        Metric::Euclidean => -euclidean(a, b),
        Metric::Dot => dot(a, b),
    }
}
