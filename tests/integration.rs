use std::collections::HashMap;

use tempfile::tempdir;
use vectordb_core::{Algorithm, Config, Engine, Error, Metric};

fn meta(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn create_library_document_chunk_round_trip() {
    let engine = Engine::new(Config::default_values());
    let library = engine.create_library("docs");
    let document = engine.create_document(&library.id, "paper", None, HashMap::new()).unwrap();
    let chunk = engine
        .create_chunk(&library.id, &document.id, "hello world", vec![1.0, 0.0, 0.0], HashMap::new())
        .unwrap();

    assert_eq!(chunk.library_id, library.id);
    assert_eq!(chunk.document_id, document.id);
}

#[test]
fn deleting_document_cascades_to_its_chunks() {
    let engine = Engine::new(Config::default_values());
    let library = engine.create_library("docs");
    let document = engine.create_document(&library.id, "paper", None, HashMap::new()).unwrap();
    let chunk = engine
        .create_chunk(&library.id, &document.id, "hello", vec![1.0, 0.0, 0.0], HashMap::new())
        .unwrap();

    engine.delete_document(&library.id, &document.id).unwrap();

    let result = engine.update_chunk(&library.id, &chunk.id, vectordb_core::ChunkPatch::default());
    assert!(matches!(result, Err(Error::ChunkNotFound(_))));
}

#[test]
fn chunk_with_wrong_document_library_is_mismatch() {
    let engine = Engine::new(Config::default_values());
    let lib_a = engine.create_library("a");
    let lib_b = engine.create_library("b");
    let doc_in_a = engine.create_document(&lib_a.id, "doc", None, HashMap::new()).unwrap();

    let result = engine.create_chunk(&lib_b.id, &doc_in_a.id, "text", vec![1.0], HashMap::new());
    assert!(matches!(result, Err(Error::LibraryMismatch { .. })));
}

#[test]
fn chunk_dimension_mismatch_is_rejected() {
    let engine = Engine::new(Config::default_values());
    let library = engine.create_library("docs");
    let document = engine.create_document(&library.id, "doc", None, HashMap::new()).unwrap();
    engine.create_chunk(&library.id, &document.id, "a", vec![1.0, 0.0], HashMap::new()).unwrap();

    let result = engine.create_chunk(&library.id, &document.id, "b", vec![1.0, 0.0, 0.0], HashMap::new());
    assert!(matches!(result, Err(Error::DimensionMismatch { expected: 2, got: 3 })));
}

#[test]
fn kdtree_requires_euclidean_lsh_requires_cosine() {
    let engine = Engine::new(Config::default_values());
    let library = engine.create_library("docs");
    let document = engine.create_document(&library.id, "doc", None, HashMap::new()).unwrap();
    engine.create_chunk(&library.id, &document.id, "a", vec![1.0, 0.0], HashMap::new()).unwrap();

    assert!(matches!(
        engine.build_index(&library.id, Algorithm::KdTree, Metric::Cosine),
        Err(Error::InvalidAlgorithmMetric { .. })
    ));
    assert!(matches!(
        engine.build_index(&library.id, Algorithm::Lsh, Metric::Euclidean),
        Err(Error::InvalidAlgorithmMetric { .. })
    ));
    assert!(engine.build_index(&library.id, Algorithm::KdTree, Metric::Euclidean).is_ok());
}

#[test]
fn search_without_built_index_falls_back_to_linear() {
    let engine = Engine::new(Config::default_values());
    let library = engine.create_library("docs");
    let document = engine.create_document(&library.id, "doc", None, HashMap::new()).unwrap();
    engine.create_chunk(&library.id, &document.id, "a", vec![0.0, 1.0, 0.0], HashMap::new()).unwrap();
    engine.create_chunk(&library.id, &document.id, "b", vec![1.0, 0.0, 0.0], HashMap::new()).unwrap();

    assert!(engine.index_config(&library.id).unwrap().is_none());
    let hits = engine.search(&library.id, &[1.0, 0.0, 0.0], 1, &HashMap::new()).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "b");
}

#[test]
fn mutating_chunks_invalidates_the_built_index() {
    let engine = Engine::new(Config::default_values());
    let library = engine.create_library("docs");
    let document = engine.create_document(&library.id, "doc", None, HashMap::new()).unwrap();
    let chunk = engine
        .create_chunk(&library.id, &document.id, "a", vec![0.0, 1.0, 0.0], HashMap::new())
        .unwrap();
    engine.build_index(&library.id, Algorithm::Linear, Metric::Cosine).unwrap();

    engine
        .update_chunk(&library.id, &chunk.id, vectordb_core::ChunkPatch { text: Some("changed".into()), embedding: None, metadata: None })
        .unwrap();

    // index_config still reports the last built descriptor even once stale;
    // search transparently falls back to a fresh linear scan instead.
    assert!(engine.index_config(&library.id).unwrap().is_some());
    let hits = engine.search(&library.id, &[0.0, 1.0, 0.0], 1, &HashMap::new()).unwrap();
    assert_eq!(hits[0].text, "changed");
}

#[test]
fn metadata_filter_matches_spec_scenario() {
    let engine = Engine::new(Config::default_values());
    let library = engine.create_library("docs");
    let document = engine.create_document(&library.id, "doc", None, HashMap::new()).unwrap();
    engine
        .create_chunk(&library.id, &document.id, "english", vec![0.0, 1.0, 0.0], meta(&[("lang", "en")]))
        .unwrap();
    engine
        .create_chunk(&library.id, &document.id, "turkish", vec![0.0, 1.0, 0.0], meta(&[("lang", "tr")]))
        .unwrap();

    let filter = meta(&[("lang", "en")]);
    let hits = engine.search(&library.id, &[0.0, 1.0, 0.0], 5, &filter).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "english");
}

#[test]
fn search_with_k_zero_is_invalid() {
    let engine = Engine::new(Config::default_values());
    let library = engine.create_library("docs");
    let result = engine.search(&library.id, &[1.0], 0, &HashMap::new());
    assert!(matches!(result, Err(Error::InvalidK(0))));
}

#[test]
fn lsh_cosine_scenario_returns_nearest_by_cosine() {
    let engine = Engine::new(Config::default_values());
    let library = engine.create_library("docs");
    let document = engine.create_document(&library.id, "doc", None, HashMap::new()).unwrap();
    engine.create_chunk(&library.id, &document.id, "a", vec![0.0, 1.0, 0.0], HashMap::new()).unwrap();
    engine.create_chunk(&library.id, &document.id, "b", vec![1.0, 0.0, 0.0], HashMap::new()).unwrap();

    engine.build_index(&library.id, Algorithm::Lsh, Metric::Cosine).unwrap();
    let hits = engine.search(&library.id, &[1.0, 0.0, 0.0], 1, &HashMap::new()).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "b");
}

#[test]
fn snapshot_round_trip_preserves_data_and_index_config() {
    let dir = tempdir().unwrap();
    let mut config = Config::default_values();
    config.data_dir = dir.path().to_path_buf();
    let engine = Engine::new(config);

    let library = engine.create_library("docs");
    let document = engine.create_document(&library.id, "doc", None, HashMap::new()).unwrap();
    engine.create_chunk(&library.id, &document.id, "a", vec![0.0, 1.0, 0.0], HashMap::new()).unwrap();
    engine.create_chunk(&library.id, &document.id, "b", vec![1.0, 0.0, 0.0], HashMap::new()).unwrap();
    let built = engine.build_index(&library.id, Algorithm::KdTree, Metric::Euclidean).unwrap();

    let before = engine.search(&library.id, &[1.0, 0.0, 0.0], 2, &HashMap::new()).unwrap();
    let (snapshot_id, _path) = engine.create_snapshot().unwrap();

    engine.delete_library(&library.id).unwrap();
    assert!(engine.get_library(&library.id).is_err());

    engine.restore_snapshot(&snapshot_id).unwrap();
    let after = engine.search(&library.id, &[1.0, 0.0, 0.0], 2, &HashMap::new()).unwrap();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.chunk_id, a.chunk_id);
    }

    let restored_config = engine.index_config(&library.id).unwrap().unwrap();
    assert_eq!(restored_config.algorithm, built.algorithm);
    assert_eq!(restored_config.metric, built.metric);
}

#[test]
fn restoring_unknown_snapshot_id_fails() {
    let dir = tempdir().unwrap();
    let mut config = Config::default_values();
    config.data_dir = dir.path().to_path_buf();
    let engine = Engine::new(config);

    let bogus = vectordb_core::SnapshotId::new();
    assert!(matches!(engine.restore_snapshot(&bogus), Err(Error::SnapshotNotFound(_))));
}
