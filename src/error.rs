//! Error taxonomy: one variant per failure mode, surfaced to callers
//! unchanged.

use thiserror::Error;

use crate::model::{Algorithm, Metric};

#[derive(Debug, Error)]
pub enum Error {
    #[error("library not found: {0}")]
    LibraryNotFound(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("chunk not found: {0}")]
    ChunkNotFound(String),

    #[error("document {document_id} belongs to library {actual}, not {expected}")]
    LibraryMismatch {
        document_id: String,
        expected: String,
        actual: String,
    },

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("k must be >= 1, got {0}")]
    InvalidK(usize),

    #[error("algorithm {algorithm} is not compatible with metric {metric}")]
    InvalidAlgorithmMetric { algorithm: Algorithm, metric: Metric },

    #[error("library {0} has no chunks")]
    EmptyLibrary(String),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("snapshot is corrupt: {0}")]
    SnapshotCorrupt(String),

    #[error("I/O error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
