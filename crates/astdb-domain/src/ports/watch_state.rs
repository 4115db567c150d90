//! C8 Watch State Manager boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FileState, StagesCompleted};

/// Aggregate counters tracked across a watch session.
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchStatistics {
    /// Total file-change events observed.
    pub total_changes: u64,
    /// Files successfully processed through every requested stage.
    pub files_processed: u64,
    /// Files that ended in `error`.
    pub errors: u64,
    /// Files skipped because they were unchanged.
    pub files_skipped: u64,
    /// Cumulative processing time, in milliseconds.
    pub total_processing_time_ms: u64,
    /// Running average per-file processing time, in milliseconds.
    pub avg_processing_time_ms: f64,
}

/// Which of a path set have changed since they were last recorded.
#[derive(Debug, Clone, Default)]
pub struct ChangedPaths {
    /// Paths whose content hash differs from the stored state (or that
    /// have no stored state).
    pub changed: Vec<String>,
    /// Paths whose content hash is unchanged.
    pub unchanged: Vec<String>,
}

/// Tracks per-file processing state across a long-lived watch session.
#[async_trait]
pub trait WatchStateManager: Send + Sync {
    /// True if `path` has no recorded state, or its current content hash
    /// differs from the stored one.
    async fn has_file_changed(&self, path: &str) -> Result<bool>;

    /// Partition `paths` into changed/unchanged, incrementing
    /// `files_skipped` for each unchanged path.
    async fn get_files_to_process(&self, paths: &[String]) -> Result<ChangedPaths>;

    /// Record a successful run for `path`: sets `status = success`,
    /// merges `stages` into the file's completed set, and updates the
    /// running average processing time with `duration_ms`.
    async fn record_success(
        &self,
        path: &str,
        stages: StagesCompleted,
        duration_ms: u64,
    ) -> Result<()>;

    /// Record a failed run for `path`: sets `status = error` and
    /// increments the error counter.
    async fn record_error(&self, path: &str, message: &str) -> Result<()>;

    /// Drop recorded state for any path not in `active_paths`, returning
    /// the number removed.
    async fn cleanup(&self, active_paths: &[String]) -> Result<usize>;

    /// The current state for a single file, if any.
    async fn get_file_state(&self, path: &str) -> Result<Option<FileState>>;

    /// Current aggregate statistics.
    async fn statistics(&self) -> Result<WatchStatistics>;

    /// Force a save to `watch-state.json` regardless of the dirty flag.
    async fn save(&self) -> Result<()>;
}
