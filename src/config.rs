//! Runtime configuration, loaded from the environment with `.env` support
//! via `dotenvy`.

use std::path::PathBuf;

use crate::model::{Algorithm, LshParams, Metric};

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub default_metric: Metric,
    pub default_index: Algorithm,
    pub lsh_num_planes: usize,
    pub lsh_num_tables: usize,
    pub lsh_seed: u64,
}

impl Config {
    pub fn default_values() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            default_metric: Metric::Cosine,
            default_index: Algorithm::Linear,
            lsh_num_planes: 16,
            lsh_num_tables: 4,
            lsh_seed: 0,
        }
    }

    /// Loads `.env` if present, then overlays `VECTORDB_*` environment
    /// variables on top of [`Config::default_values`]. Unparseable values
    /// are ignored in favour of the default rather than panicking at
    /// startup.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut cfg = Self::default_values();

        if let Ok(v) = std::env::var("VECTORDB_DATA_DIR") {
            cfg.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("VECTORDB_DEFAULT_METRIC") {
            if let Some(m) = parse_metric(&v) {
                cfg.default_metric = m;
            }
        }
        if let Ok(v) = std::env::var("VECTORDB_DEFAULT_INDEX") {
            if let Some(a) = parse_algorithm(&v) {
                cfg.default_index = a;
            }
        }
        if let Ok(v) = std::env::var("VECTORDB_LSH_NUM_PLANES") {
            if let Ok(n) = v.parse() {
                cfg.lsh_num_planes = n;
            }
        }
        if let Ok(v) = std::env::var("VECTORDB_LSH_NUM_TABLES") {
            if let Ok(n) = v.parse() {
                cfg.lsh_num_tables = n;
            }
        }
        if let Ok(v) = std::env::var("VECTORDB_LSH_SEED") {
            if let Ok(n) = v.parse() {
                cfg.lsh_seed = n;
            }
        }
        cfg
    }

    pub fn lsh_params(&self) -> LshParams {
        LshParams {
            num_tables: self.lsh_num_tables,
            num_planes: self.lsh_num_planes,
            seed: self.lsh_seed,
        }
    }
}

fn parse_metric(s: &str) -> Option<Metric> {
    match s.to_ascii_lowercase().as_str() {
        "cosine" => Some(Metric::Cosine),
        "euclidean" => Some(Metric::Euclidean),
        "dot" => Some(Metric::Dot),
        _ => None,
    }
}

fn parse_algorithm(s: &str) -> Option<Algorithm> {
    match s.to_ascii_lowercase().as_str() {
        "linear" => Some(Algorithm::Linear),
        "kdtree" | "kd_tree" | "kd-tree" => Some(Algorithm::KdTree),
        "lsh" => Some(Algorithm::Lsh),
        _ => None,
    }
}
