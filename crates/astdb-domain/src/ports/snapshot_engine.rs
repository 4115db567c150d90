//! C9 Snapshot Engine boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::SnapshotMetadata;

/// One phase of a snapshot create/restore operation, for progress
/// reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPhase {
    /// Walking the source tree to resolve the file set.
    Scanning,
    /// Streaming files into the archive.
    Compressing,
    /// Computing the checksum and moving the archive into place.
    Finalizing,
}

/// A single progress update; `percentage` is monotonically
/// non-decreasing within one operation.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotProgress {
    /// Current phase.
    pub phase: SnapshotPhase,
    /// Completion percentage in `[0, 100]`.
    pub percentage: u8,
}

/// Inputs to [`SnapshotEngine::create_snapshot`].
#[derive(Debug, Clone)]
pub struct CreateSnapshotOptions {
    /// Path of the `.astdb/` directory to pack.
    pub astdb_path: String,
    /// Destination archive path.
    pub output_path: String,
    /// Snapshot format version; defaults to the schema's pinned version.
    pub version: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// User-supplied tags.
    pub tags: Vec<String>,
    /// gzip compression level, `0..=9`.
    pub compression_level: u8,
    /// Include `models/` in the archive.
    pub include_models: bool,
    /// Include any cache artifacts.
    pub include_cache: bool,
    /// Include log files.
    pub include_logs: bool,
}

/// Inputs to [`SnapshotEngine::restore_snapshot`].
#[derive(Debug, Clone)]
pub struct RestoreSnapshotOptions {
    /// Source archive path.
    pub snapshot_path: String,
    /// Destination `.astdb/` directory.
    pub target_path: String,
    /// Rename an existing `target_path` to `target_path.bak.<epochMs>`
    /// before extracting.
    pub create_backup: bool,
    /// Verify the archive's checksum before extracting.
    pub validate_checksum: bool,
    /// Skip restoring `models/`.
    pub skip_models: bool,
    /// Overwrite `target_path` if it exists and `create_backup` is
    /// false.
    pub overwrite: bool,
}

/// Outcome of a restore.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    /// Where the snapshot was extracted to.
    pub target_path: String,
    /// Number of files written.
    pub files_restored: u64,
    /// Path the pre-existing target was moved to, if a backup was made.
    pub backup_path: Option<String>,
    /// Wall-clock duration of the restore, in milliseconds.
    pub duration_ms: u64,
    /// The restored snapshot's embedded metadata.
    pub metadata: SnapshotMetadata,
}

/// A remote location snapshots can be published to and fetched from.
#[async_trait]
pub trait RemoteSnapshotStorage: Send + Sync {
    /// Upload the archive at `local_path`, returning its remote id, URL
    /// and metadata.
    async fn publish(&self, local_path: &str) -> Result<(String, String, SnapshotMetadata)>;

    /// Download the archive identified by `id` to `local_path`, returning
    /// the local path written.
    async fn download(&self, id: &str, local_path: &str) -> Result<String>;

    /// List remotely stored snapshots as `(id, url, metadata)` triples.
    async fn list(&self) -> Result<Vec<(String, String, SnapshotMetadata)>>;

    /// Delete the remote snapshot identified by `id`.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Deterministic pack/verify/restore of an `.astdb/` directory.
#[async_trait]
pub trait SnapshotEngine: Send + Sync {
    /// Pack `options.astdb_path` into a checksummed, compressed archive
    /// at `options.output_path`, invoking `on_progress` with
    /// monotonically non-decreasing percentages.
    async fn create_snapshot(
        &self,
        options: CreateSnapshotOptions,
        on_progress: Option<Box<dyn Fn(SnapshotProgress) + Send + Sync>>,
    ) -> Result<SnapshotMetadata>;

    /// Verify and extract an archive, optionally backing up any existing
    /// `target_path` first.
    async fn restore_snapshot(
        &self,
        options: RestoreSnapshotOptions,
        on_progress: Option<Box<dyn Fn(SnapshotProgress) + Send + Sync>>,
    ) -> Result<RestoreOutcome>;
}
