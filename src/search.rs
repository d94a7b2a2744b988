//! Search coordinator: validate, choose an index, filter, return ranked hits.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::index::linear::LinearIndex;
use crate::model::{ChunkId, DocumentId, LibraryId, Metadata, Metric};
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub chunk_id: ChunkId,
    pub document_id: DocumentId,
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
}

/// Validates `library exists; k >= 1; query dimension == library dimension`,
/// then searches the library's built index if it is fresh, falling back to
/// a fresh `LinearIndex` scan under `default_metric` otherwise.
pub fn search(
    store: &Store,
    library_id: &LibraryId,
    query: &[f32],
    k: usize,
    filter: &HashMap<String, String>,
    default_metric: Metric,
) -> Result<Vec<SearchHit>> {
    if k == 0 {
        return Err(Error::InvalidK(k));
    }
    let handle = store.handle(library_id)?;
    let rec = handle.read();

    if let Some(dim) = rec.dimension {
        if query.len() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                got: query.len(),
            });
        }
    }

    let results = match &rec.index {
        Some(entry) if entry.valid => entry.index.search(query, k, entry.config.metric, &rec.chunks, filter, &rec.chunk_seq),
        _ => {
            let chunk_refs: Vec<_> = rec.chunks.values().collect();
            let linear = LinearIndex::build(&chunk_refs);
            linear.search(query, k, default_metric, &rec.chunks, filter, &rec.chunk_seq)
        }
    };

    Ok(results
        .into_iter()
        .filter_map(|(id, score)| {
            rec.chunks.get(&id).map(|chunk| SearchHit {
                chunk_id: id,
                document_id: chunk.document_id.clone(),
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                score,
            })
        })
        .collect())
}
