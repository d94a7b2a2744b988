//! Quick end-to-end smoke test: ingest, build each index type, search,
//! snapshot, restore. Run with `cargo run --release --bin load_test`.

use std::collections::HashMap;
use std::time::Instant;

use rand::{rngs::StdRng, Rng, SeedableRng};
use vectordb_core::{Algorithm, Config, Engine, Metric};

const DIM: usize = 64;
const CHUNK_COUNT: usize = 20_000;

fn main() {
    tracing_subscriber::fmt::init();

    let engine = Engine::new(Config::default_values());
    let library = engine.create_library("load-test");
    let document = engine
        .create_document(&library.id, "load-test doc", None, HashMap::new())
        .expect("create document");

    let mut rng = StdRng::seed_from_u64(42);
    let start = Instant::now();
    for i in 0..CHUNK_COUNT {
        let embedding: Vec<f32> = (0..DIM).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();
        engine
            .create_chunk(&library.id, &document.id, format!("chunk {i}"), embedding, HashMap::new())
            .expect("create chunk");
    }
    println!("ingested {CHUNK_COUNT} chunks in {:?}", start.elapsed());

    for (algorithm, metric) in [
        (Algorithm::Linear, Metric::Cosine),
        (Algorithm::KdTree, Metric::Euclidean),
        (Algorithm::Lsh, Metric::Cosine),
    ] {
        let start = Instant::now();
        let config = engine.build_index(&library.id, algorithm, metric).expect("build index");
        println!("built {algorithm}/{metric} index ({} chunks) in {:?}", config.chunk_count, start.elapsed());

        let query: Vec<f32> = (0..DIM).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();
        let start = Instant::now();
        let hits = engine.search(&library.id, &query, 10, &HashMap::new()).expect("search");
        println!("searched {algorithm}/{metric} in {:?}, top hit score {:?}", start.elapsed(), hits.first().map(|h| h.score));
    }

    let (snapshot_id, path) = engine.create_snapshot().expect("create snapshot");
    println!("wrote snapshot {snapshot_id} to {}", path.display());
    engine.restore_snapshot(&snapshot_id).expect("restore snapshot");
    println!("restored snapshot {snapshot_id} successfully");
}
