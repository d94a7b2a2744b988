//! Store: CRUD for libraries, documents, chunks.
//!
//! Each library's `(documents, chunks, index config, materialised index)` is
//! one `parking_lot::RwLock<LibraryRecord>` — `parking_lot` over
//! `std::sync::RwLock` for its cheap uncontended fast path with no OS futex
//! call. The outer `RwLock<HashMap<..>>` is the global writer lock for
//! library-level structural changes and snapshot restore.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::index::Index;
use crate::model::{Chunk, ChunkId, Document, DocumentId, IndexConfig, Library, LibraryId, Metadata};

/// The materialised index plus its descriptor and freshness flag. Logically
/// owned by the index registry (`crate::registry`); stored here so it
/// shares the per-library lock with the data it was built from, rather than
/// needing a second lock acquisition to stay consistent with it.
pub struct IndexEntry {
    pub config: IndexConfig,
    pub index: Index,
    pub valid: bool,
}

pub struct LibraryRecord {
    pub library: Library,
    pub documents: HashMap<DocumentId, Document>,
    pub chunks: HashMap<ChunkId, Chunk>,
    pub chunk_seq: HashMap<ChunkId, u64>,
    pub next_seq: u64,
    pub dimension: Option<usize>,
    pub index: Option<IndexEntry>,
}

impl LibraryRecord {
    fn new(library: Library) -> Self {
        Self {
            library,
            documents: HashMap::new(),
            chunks: HashMap::new(),
            chunk_seq: HashMap::new(),
            next_seq: 0,
            dimension: None,
            index: None,
        }
    }

    fn invalidate(&mut self) {
        if let Some(entry) = self.index.as_mut() {
            entry.valid = false;
        }
    }
}

#[derive(Default)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<Metadata>,
}

#[derive(Default)]
pub struct ChunkPatch {
    pub text: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub metadata: Option<Metadata>,
}

pub struct Store {
    libraries: RwLock<HashMap<LibraryId, Arc<RwLock<LibraryRecord>>>>,
    /// Global document_id -> owning library_id index, so a chunk create
    /// naming a document from a different library can be reported as
    /// `LibraryMismatch` rather than indistinguishable from `DocumentNotFound`.
    document_index: RwLock<HashMap<DocumentId, LibraryId>>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            libraries: RwLock::new(HashMap::new()),
            document_index: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn handle(&self, id: &LibraryId) -> Result<Arc<RwLock<LibraryRecord>>> {
        self.libraries
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::LibraryNotFound(id.to_string()))
    }

    // ---- Libraries ----

    pub fn create_library(&self, name: String) -> Library {
        let library = Library {
            id: LibraryId::new(),
            name,
            created_at: Utc::now(),
        };
        self.libraries
            .write()
            .insert(library.id.clone(), Arc::new(RwLock::new(LibraryRecord::new(library.clone()))));
        tracing::info!(library_id = %library.id, "library created");
        library
    }

    pub fn get_library(&self, id: &LibraryId) -> Result<Library> {
        Ok(self.handle(id)?.read().library.clone())
    }

    pub fn list_libraries(&self) -> Vec<Library> {
        self.libraries.read().values().map(|h| h.read().library.clone()).collect()
    }

    pub fn delete_library(&self, id: &LibraryId) -> Result<()> {
        let removed = self.libraries.write().remove(id);
        let record = removed.ok_or_else(|| Error::LibraryNotFound(id.to_string()))?;
        let mut doc_index = self.document_index.write();
        for document_id in record.read().documents.keys() {
            doc_index.remove(document_id);
        }
        tracing::info!(library_id = %id, "library deleted");
        Ok(())
    }

    // ---- Documents ----

    pub fn create_document(
        &self,
        library_id: &LibraryId,
        title: String,
        description: Option<String>,
        metadata: Metadata,
    ) -> Result<Document> {
        let handle = self.handle(library_id)?;
        let document = Document {
            id: DocumentId::new(),
            library_id: library_id.clone(),
            title,
            description,
            metadata,
            created_at: Utc::now(),
        };
        handle.write().documents.insert(document.id.clone(), document.clone());
        self.document_index.write().insert(document.id.clone(), library_id.clone());
        Ok(document)
    }

    pub fn get_document(&self, library_id: &LibraryId, document_id: &DocumentId) -> Result<Document> {
        let handle = self.handle(library_id)?;
        let rec = handle.read();
        rec.documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))
    }

    pub fn update_document(
        &self,
        library_id: &LibraryId,
        document_id: &DocumentId,
        patch: DocumentPatch,
    ) -> Result<Document> {
        let handle = self.handle(library_id)?;
        let mut rec = handle.write();
        let document = rec
            .documents
            .get_mut(document_id)
            .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;
        if let Some(title) = patch.title {
            document.title = title;
        }
        if let Some(description) = patch.description {
            document.description = Some(description);
        }
        if let Some(metadata) = patch.metadata {
            document.metadata = metadata;
        }
        Ok(document.clone())
    }

    /// Cascades: every chunk with this `document_id` is removed, which
    /// invalidates the library's index if any were removed.
    pub fn delete_document(&self, library_id: &LibraryId, document_id: &DocumentId) -> Result<()> {
        let handle = self.handle(library_id)?;
        let mut rec = handle.write();
        if rec.documents.remove(document_id).is_none() {
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }
        self.document_index.write().remove(document_id);

        let orphaned: Vec<ChunkId> = rec
            .chunks
            .iter()
            .filter(|(_, c)| &c.document_id == document_id)
            .map(|(id, _)| id.clone())
            .collect();
        let cascaded = !orphaned.is_empty();
        for chunk_id in orphaned {
            rec.chunks.remove(&chunk_id);
            rec.chunk_seq.remove(&chunk_id);
        }
        if cascaded {
            rec.invalidate();
        }
        Ok(())
    }

    // ---- Chunks ----

    pub fn create_chunk(
        &self,
        library_id: &LibraryId,
        document_id: &DocumentId,
        text: String,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Result<Chunk> {
        let handle = self.handle(library_id)?;

        let owner = self.document_index.read().get(document_id).cloned();
        let owner_library = owner.ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;
        if &owner_library != library_id {
            return Err(Error::LibraryMismatch {
                document_id: document_id.to_string(),
                expected: library_id.to_string(),
                actual: owner_library.to_string(),
            });
        }

        let mut rec = handle.write();
        match rec.dimension {
            Some(d) if d != embedding.len() => {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    got: embedding.len(),
                });
            }
            None => rec.dimension = Some(embedding.len()),
            _ => {}
        }

        let chunk = Chunk {
            id: ChunkId::new(),
            library_id: library_id.clone(),
            document_id: document_id.clone(),
            text,
            embedding,
            metadata,
            created_at: Utc::now(),
        };
        let seq = rec.next_seq;
        rec.next_seq += 1;
        rec.chunk_seq.insert(chunk.id.clone(), seq);
        rec.chunks.insert(chunk.id.clone(), chunk.clone());
        rec.invalidate();
        Ok(chunk)
    }

    pub fn update_chunk(&self, library_id: &LibraryId, chunk_id: &ChunkId, patch: ChunkPatch) -> Result<Chunk> {
        let handle = self.handle(library_id)?;
        let mut rec = handle.write();
        let dimension = rec.dimension;
        if let Some(embedding) = &patch.embedding {
            if let Some(d) = dimension {
                if embedding.len() != d {
                    return Err(Error::DimensionMismatch {
                        expected: d,
                        got: embedding.len(),
                    });
                }
            }
        }
        let chunk = rec
            .chunks
            .get_mut(chunk_id)
            .ok_or_else(|| Error::ChunkNotFound(chunk_id.to_string()))?;
        if let Some(text) = patch.text {
            chunk.text = text;
        }
        if let Some(embedding) = patch.embedding {
            chunk.embedding = embedding;
        }
        if let Some(metadata) = patch.metadata {
            chunk.metadata = metadata;
        }
        let updated = chunk.clone();
        rec.invalidate();
        Ok(updated)
    }

    pub fn delete_chunk(&self, library_id: &LibraryId, chunk_id: &ChunkId) -> Result<()> {
        let handle = self.handle(library_id)?;
        let mut rec = handle.write();
        if rec.chunks.remove(chunk_id).is_none() {
            return Err(Error::ChunkNotFound(chunk_id.to_string()));
        }
        rec.chunk_seq.remove(chunk_id);
        rec.invalidate();
        Ok(())
    }

    // ---- Snapshot support ----

    pub fn snapshot_payload(&self) -> (Vec<Library>, Vec<Document>, Vec<Chunk>, Vec<IndexConfig>) {
        let libraries = self.libraries.read();
        let mut libs = Vec::with_capacity(libraries.len());
        let mut docs = Vec::new();
        let mut chunks = Vec::new();
        let mut indexes = Vec::new();
        for handle in libraries.values() {
            let rec = handle.read();
            libs.push(rec.library.clone());
            docs.extend(rec.documents.values().cloned());
            let mut ordered: Vec<&Chunk> = rec.chunks.values().collect();
            ordered.sort_by_key(|c| rec.chunk_seq.get(&c.id).copied().unwrap_or(u64::MAX));
            chunks.extend(ordered.into_iter().cloned());
            if let Some(entry) = &rec.index {
                indexes.push(entry.config.clone());
            }
        }
        (libs, docs, chunks, indexes)
    }

    /// Replaces the entire in-memory state wholesale: takes the global
    /// writer lock, evicts, rebuilds, releases.
    pub fn restore(
        &self,
        libraries: Vec<Library>,
        documents: Vec<Document>,
        chunks: Vec<Chunk>,
        index_configs: Vec<IndexConfig>,
    ) -> Result<()> {
        let mut records: HashMap<LibraryId, LibraryRecord> = libraries
            .into_iter()
            .map(|lib| (lib.id.clone(), LibraryRecord::new(lib)))
            .collect();

        let mut new_document_index = HashMap::new();
        for document in documents {
            new_document_index.insert(document.id.clone(), document.library_id.clone());
            if let Some(rec) = records.get_mut(&document.library_id) {
                rec.documents.insert(document.id.clone(), document);
            }
        }

        for chunk in chunks {
            if let Some(rec) = records.get_mut(&chunk.library_id) {
                if rec.dimension.is_none() {
                    rec.dimension = Some(chunk.embedding.len());
                }
                let seq = rec.next_seq;
                rec.next_seq += 1;
                rec.chunk_seq.insert(chunk.id.clone(), seq);
                rec.chunks.insert(chunk.id.clone(), chunk);
            }
        }

        for config in index_configs {
            if let Some(rec) = records.get_mut(&config.library_id) {
                let chunk_refs: Vec<&Chunk> = rec.chunks.values().collect();
                let index = Index::build(config.algorithm, config.metric, &chunk_refs, config.lsh_params)?;
                rec.index = Some(IndexEntry {
                    config,
                    index,
                    valid: true,
                });
            }
        }

        let new_map: HashMap<LibraryId, Arc<RwLock<LibraryRecord>>> = records
            .into_iter()
            .map(|(id, rec)| (id, Arc::new(RwLock::new(rec))))
            .collect();

        *self.libraries.write() = new_map;
        *self.document_index.write() = new_document_index;
        tracing::info!("store restored from snapshot");
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
