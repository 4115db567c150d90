//! Snapshot archive metadata.

use serde::{Deserialize, Serialize};

/// Uncompressed/compressed size accounting for a snapshot archive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SnapshotSize {
    /// Total bytes of the source tree before compression.
    pub uncompressed: u64,
    /// Bytes of the final archive.
    pub compressed: u64,
}

impl SnapshotSize {
    /// `compressed / uncompressed`, or `0.0` when uncompressed is zero.
    #[must_use]
    pub fn ratio(self) -> f64 {
        if self.uncompressed == 0 {
            0.0
        } else {
            self.compressed as f64 / self.uncompressed as f64
        }
    }
}

/// Repository provenance recorded in a snapshot, when the indexed
/// workspace is a git checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Remote URL, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Commit sha at snapshot time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    /// Branch name at snapshot time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Number of files indexed.
    pub file_count: u64,
}

/// Header metadata embedded in a snapshot archive (spec §4.C9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Snapshot format version.
    pub version: String,
    /// Unix epoch milliseconds of creation.
    pub created_at: u64,
    /// Optional free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// User-supplied tags.
    pub tags: Vec<String>,
    /// Size accounting.
    pub size: SnapshotSize,
    /// sha256 (hex) of the archive bytes.
    pub checksum: String,
    /// Repository provenance.
    pub repository: RepositoryInfo,
}
