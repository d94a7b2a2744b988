//! Data model: libraries, documents, chunks, and index descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(LibraryId);
opaque_id!(DocumentId);
opaque_id!(ChunkId);
opaque_id!(SnapshotId);

pub type Metadata = HashMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub id: LibraryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub library_id: LibraryId,
    pub title: String,
    pub description: Option<String>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub library_id: LibraryId,
    pub document_id: DocumentId,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// Distance metric used to score a pair of embeddings. Higher score is
/// always better — see [`crate::metric::score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Euclidean,
    Dot,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
            Metric::Dot => "dot",
        };
        write!(f, "{s}")
    }
}

/// Index structure used to answer k-NN queries for a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Linear,
    KdTree,
    Lsh,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Algorithm::Linear => "linear",
            Algorithm::KdTree => "kdtree",
            Algorithm::Lsh => "lsh",
        };
        write!(f, "{s}")
    }
}

/// Library-wide LSH build parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LshParams {
    pub num_tables: usize,
    pub num_planes: usize,
    pub seed: u64,
}

/// Descriptor for the index currently built (or last built) for a library.
/// Index internals (KD-tree nodes, LSH tables) are not part of this struct —
/// they live only in the materialised, in-memory index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub library_id: LibraryId,
    pub algorithm: Algorithm,
    pub metric: Metric,
    pub built_at: DateTime<Utc>,
    pub chunk_count: usize,
    pub dimension: usize,
    #[serde(default)]
    pub lsh_params: Option<LshParams>,
}
