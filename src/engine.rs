//! `Engine`: the single public entry point composing the store, index
//! registry, search coordinator, and snapshot codec under one configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::model::{Algorithm, Chunk, ChunkId, Document, DocumentId, IndexConfig, Library, LibraryId, Metadata, Metric, SnapshotId};
use crate::registry::IndexRegistry;
use crate::search::{self, SearchHit};
use crate::snapshot;
use crate::store::{ChunkPatch, DocumentPatch, Store};

pub struct Engine {
    store: Store,
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            store: Store::new(),
            config,
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(Config::from_env())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- Libraries ----

    pub fn create_library(&self, name: impl Into<String>) -> Library {
        self.store.create_library(name.into())
    }

    pub fn get_library(&self, id: &LibraryId) -> Result<Library> {
        self.store.get_library(id)
    }

    pub fn list_libraries(&self) -> Vec<Library> {
        self.store.list_libraries()
    }

    pub fn delete_library(&self, id: &LibraryId) -> Result<()> {
        self.store.delete_library(id)
    }

    // ---- Documents ----

    pub fn create_document(
        &self,
        library_id: &LibraryId,
        title: impl Into<String>,
        description: Option<String>,
        metadata: Metadata,
    ) -> Result<Document> {
        self.store.create_document(library_id, title.into(), description, metadata)
    }

    pub fn get_document(&self, library_id: &LibraryId, document_id: &DocumentId) -> Result<Document> {
        self.store.get_document(library_id, document_id)
    }

    pub fn update_document(&self, library_id: &LibraryId, document_id: &DocumentId, patch: DocumentPatch) -> Result<Document> {
        self.store.update_document(library_id, document_id, patch)
    }

    pub fn delete_document(&self, library_id: &LibraryId, document_id: &DocumentId) -> Result<()> {
        self.store.delete_document(library_id, document_id)
    }

    // ---- Chunks ----

    pub fn create_chunk(
        &self,
        library_id: &LibraryId,
        document_id: &DocumentId,
        text: impl Into<String>,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Result<Chunk> {
        self.store.create_chunk(library_id, document_id, text.into(), embedding, metadata)
    }

    pub fn update_chunk(&self, library_id: &LibraryId, chunk_id: &ChunkId, patch: ChunkPatch) -> Result<Chunk> {
        self.store.update_chunk(library_id, chunk_id, patch)
    }

    pub fn delete_chunk(&self, library_id: &LibraryId, chunk_id: &ChunkId) -> Result<()> {
        self.store.delete_chunk(library_id, chunk_id)
    }

    // ---- Index ----

    pub fn build_index(&self, library_id: &LibraryId, algorithm: Algorithm, metric: Metric) -> Result<IndexConfig> {
        let lsh_params = (algorithm == Algorithm::Lsh).then(|| self.config.lsh_params());
        IndexRegistry::new(&self.store).build(library_id, algorithm, metric, lsh_params)
    }

    pub fn index_config(&self, library_id: &LibraryId) -> Result<Option<IndexConfig>> {
        IndexRegistry::new(&self.store).get(library_id)
    }

    pub fn invalidate_index(&self, library_id: &LibraryId) -> Result<()> {
        IndexRegistry::new(&self.store).invalidate(library_id)
    }

    pub fn drop_index(&self, library_id: &LibraryId) -> Result<()> {
        IndexRegistry::new(&self.store).drop_index(library_id)
    }

    // ---- Search ----

    pub fn search(
        &self,
        library_id: &LibraryId,
        query: &[f32],
        k: usize,
        filter: &HashMap<String, String>,
    ) -> Result<Vec<SearchHit>> {
        search::search(&self.store, library_id, query, k, filter, self.config.default_metric)
    }

    // ---- Snapshots ----

    pub fn create_snapshot(&self) -> Result<(SnapshotId, PathBuf)> {
        snapshot::create_snapshot(&self.store, &self.config.data_dir)
    }

    pub fn restore_snapshot(&self, id: &SnapshotId) -> Result<()> {
        snapshot::restore_snapshot(&self.store, &self.config.data_dir, id)
    }

    pub fn list_snapshots(&self) -> Result<Vec<SnapshotId>> {
        snapshot::list_snapshots(&self.config.data_dir)
    }
}
