//! Index registry: build/get/invalidate/drop.
//!
//! Operates through the same per-library `RwLock` the store uses, rather
//! than a second lock over a parallel map — the registry's `IndexEntry` is
//! physically part of `store::LibraryRecord` precisely so these two
//! components never need to be locked in a particular order to stay
//! consistent with each other.

use crate::error::Result;
use crate::index::Index;
use crate::model::{Algorithm, Chunk, IndexConfig, LibraryId, LshParams, Metric};
use crate::store::{IndexEntry, Store};
use chrono::Utc;

pub struct IndexRegistry<'s> {
    store: &'s Store,
}

impl<'s> IndexRegistry<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Builds from the library's current chunks and replaces any existing
    /// index for it, valid immediately. `0` chunks is accepted and produces
    /// an empty, valid index.
    pub fn build(
        &self,
        library_id: &LibraryId,
        algorithm: Algorithm,
        metric: Metric,
        lsh_params: Option<LshParams>,
    ) -> Result<IndexConfig> {
        let handle = self.store.handle(library_id)?;
        let mut rec = handle.write();
        let chunk_refs: Vec<&Chunk> = rec.chunks.values().collect();
        let index = Index::build(algorithm, metric, &chunk_refs, lsh_params)?;
        let config = IndexConfig {
            library_id: library_id.clone(),
            algorithm,
            metric,
            built_at: Utc::now(),
            chunk_count: chunk_refs.len(),
            dimension: rec.dimension.unwrap_or(0),
            lsh_params,
        };
        rec.index = Some(IndexEntry {
            config: config.clone(),
            index,
            valid: true,
        });
        tracing::info!(library_id = %library_id, %algorithm, %metric, chunk_count = config.chunk_count, "index built");
        Ok(config)
    }

    /// The current descriptor, valid or not — callers that care about
    /// freshness should check `crate::search::search`'s fallback behaviour
    /// instead of this accessor.
    pub fn get(&self, library_id: &LibraryId) -> Result<Option<IndexConfig>> {
        let handle = self.store.handle(library_id)?;
        Ok(handle.read().index.as_ref().map(|entry| entry.config.clone()))
    }

    pub fn invalidate(&self, library_id: &LibraryId) -> Result<()> {
        let handle = self.store.handle(library_id)?;
        if let Some(entry) = handle.write().index.as_mut() {
            entry.valid = false;
        }
        Ok(())
    }

    pub fn drop_index(&self, library_id: &LibraryId) -> Result<()> {
        let handle = self.store.handle(library_id)?;
        handle.write().index = None;
        Ok(())
    }
}
