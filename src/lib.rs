//! An in-memory vector database: libraries of documents made of embedded
//! chunks, three interchangeable k-NN index algorithms, metadata filtering,
//! and JSON snapshot/restore.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod metric;
pub mod model;
pub mod registry;
pub mod search;
pub mod snapshot;
pub mod store;

pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};
pub use model::{Algorithm, Chunk, ChunkId, Document, DocumentId, IndexConfig, Library, LibraryId, LshParams, Metadata, Metric, SnapshotId};
pub use search::SearchHit;
pub use store::{ChunkPatch, DocumentPatch};
