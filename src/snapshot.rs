//! JSON snapshot codec: atomic write-then-rename, full replace on restore.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Chunk, Document, IndexConfig, Library, SnapshotId};
use crate::store::Store;

const CURRENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotPayload {
    version: u32,
    libraries: Vec<Library>,
    documents: Vec<Document>,
    chunks: Vec<Chunk>,
    indexes: Vec<IndexConfig>,
}

fn snapshots_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("snapshots")
}

/// Writes `<data_dir>/snapshots/<id>.json` via a sibling temp file and
/// `rename`, so a reader never observes a partially-written snapshot.
pub fn create_snapshot(store: &Store, data_dir: &Path) -> Result<(SnapshotId, PathBuf)> {
    let id = SnapshotId::new();
    let (libraries, documents, chunks, indexes) = store.snapshot_payload();
    let payload = SnapshotPayload {
        version: CURRENT_VERSION,
        libraries,
        documents,
        chunks,
        indexes,
    };

    let dir = snapshots_dir(data_dir);
    std::fs::create_dir_all(&dir)?;
    let final_path = dir.join(format!("{id}.json"));
    let tmp_path = dir.join(format!(".{id}.json.tmp"));

    let bytes = serde_json::to_vec_pretty(&payload).map_err(|e| Error::Internal(e.to_string()))?;
    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, &final_path)?;

    tracing::info!(snapshot_id = %id, path = %final_path.display(), "snapshot created");
    Ok((id, final_path))
}

/// Replaces the entire store wholesale under its global writer lock,
/// rebuilding each library's index from the recorded `(algorithm, metric)`
/// pair.
pub fn restore_snapshot(store: &Store, data_dir: &Path, id: &SnapshotId) -> Result<()> {
    let path = snapshots_dir(data_dir).join(format!("{id}.json"));
    let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::SnapshotNotFound(id.to_string()),
        _ => Error::IOError(e),
    })?;
    let payload: SnapshotPayload =
        serde_json::from_slice(&bytes).map_err(|e| Error::SnapshotCorrupt(e.to_string()))?;

    store.restore(payload.libraries, payload.documents, payload.chunks, payload.indexes)?;
    tracing::info!(snapshot_id = %id, "snapshot restored");
    Ok(())
}

pub fn list_snapshots(data_dir: &Path) -> Result<Vec<SnapshotId>> {
    let dir = snapshots_dir(data_dir);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
            if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                ids.push(SnapshotId::from(stem.to_string()));
            }
        }
    }
    Ok(ids)
}
