use std::collections::HashSet;

use camino::Utf8PathBuf;

mod io_utils;

pub mod engine;
pub mod progress;
pub mod remote;

// Re-export core engine components
pub use engine::{Fetcher, UpdateEngine};
pub use progress::{LogProgress, NullProgress, PhaseProgress, ProgressReporter};
pub use remote::fetch_manifest;

/// Plain configuration handed to the engine at construction.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Root of the install tree descriptors are resolved against.
    pub install_root: Utf8PathBuf,
    /// Filenames never created by the fetch path when absent locally.
    pub ignore_on_update: HashSet<String>,
    /// Bound on concurrent descriptor fetches.
    pub download_threads: usize,
    pub rate_limit_bytes: Option<u64>,
}

impl UpdateConfig {
    pub fn new(install_root: Utf8PathBuf) -> Self {
        Self {
            install_root,
            ignore_on_update: HashSet::new(),
            download_threads: 4,
            rate_limit_bytes: None,
        }
    }
}

/// Terminal result of one update run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Every descriptor verified locally; no network activity happened.
    UpToDate,
    /// All stale or missing files were fetched and committed.
    Updated,
    /// The named descriptor exhausted its mirrors; nothing was committed.
    Failed { name: String },
}

/// High-level error type for update runs. Per-mirror failures never surface
/// here; they are absorbed by the downloader and reported through
/// [`UpdateOutcome::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("manifest error: {0}")]
    Manifest(String),
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("update task failed: {0}")]
    Task(String),
}

/// Convenience constructor for the default engine.
pub fn default_engine(client: reqwest::Client, config: UpdateConfig) -> UpdateEngine {
    UpdateEngine::new(client, config)
}
