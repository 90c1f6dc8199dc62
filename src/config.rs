use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shard configuration
///
/// One shard process owns the segments found under `index_dir` and answers
/// queries on `port`. All limits mirror the engine defaults; they are
/// exposed here so embedders and tests can tighten them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShardConfig {
    /// Directory scanned for `*.bin` segment files at startup
    pub index_dir: PathBuf,
    /// TCP port the query endpoint listens on
    pub port: u16,
    /// Worker threads per query in the ranker pool
    pub ranker_workers: usize,
    /// Results returned per query after the cross-segment merge
    pub max_results: usize,
    /// Cumulative candidate cap across the segments of one query
    pub max_ranked_docs: usize,
    /// Process-wide cap on bytes pinned with mlock
    pub max_locked_bytes: u64,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./index"),
            port: 8080,
            ranker_workers: 14,
            max_results: 10,
            max_ranked_docs: 200,
            max_locked_bytes: 40 * 1024 * 1024 * 1024,
        }
    }
}

impl ShardConfig {
    /// Create a configuration for the given index directory and port
    pub fn new(index_dir: PathBuf, port: u16) -> Self {
        Self {
            index_dir,
            port,
            ..Self::default()
        }
    }

    /// Override the ranker worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.ranker_workers = workers.max(1);
        self
    }
}
