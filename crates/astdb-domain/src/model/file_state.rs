//! Watch-loop per-file bookkeeping.

use serde::{Deserialize, Serialize};

/// Processing outcome for a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Observed but not yet processed.
    Pending,
    /// Processed through every requested stage.
    Success,
    /// A stage failed; see [`FileState::error`].
    Error,
    /// Excluded by glob/config and deliberately not processed.
    Skipped,
}

/// Which pipeline stages have completed for a file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StagesCompleted {
    /// The file has been parsed into ASTNodes.
    pub parsed: bool,
    /// Its nodes have been annotated.
    pub annotated: bool,
    /// Its nodes have been embedded and indexed.
    pub embedded: bool,
}

impl StagesCompleted {
    /// All three stages done.
    #[must_use]
    pub fn all_done(self) -> bool {
        self.parsed && self.annotated && self.embedded
    }
}

/// Watch-loop record for a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileState {
    /// Path relative to the workspace root.
    pub file_path: String,
    /// Unix epoch milliseconds of the file's mtime at last observation.
    pub last_modified: u64,
    /// sha256 content hash (hex) at last observation.
    pub content_hash: String,
    /// Unix epoch milliseconds of the last processing attempt, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_processed: Option<u64>,
    /// Current status.
    pub status: FileStatus,
    /// Error message from the most recent failed stage, if `status ==
    /// Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-stage completion flags.
    pub stages_completed: StagesCompleted,
}

impl FileState {
    /// A fresh, unprocessed record for a newly observed file.
    #[must_use]
    pub fn new_pending(file_path: impl Into<String>, last_modified: u64, content_hash: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            last_modified,
            content_hash: content_hash.into(),
            last_processed: None,
            status: FileStatus::Pending,
            error: None,
            stages_completed: StagesCompleted::default(),
        }
    }

    /// Whether `new_hash` differs from the recorded content hash, i.e.
    /// whether the file needs reprocessing.
    #[must_use]
    pub fn has_changed(&self, new_hash: &str) -> bool {
        self.content_hash != new_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pending_has_no_stages_completed() {
        let state = FileState::new_pending("a.rs", 0, "deadbeef");
        assert_eq!(state.status, FileStatus::Pending);
        assert!(!state.stages_completed.all_done());
    }

    #[test]
    fn has_changed_compares_content_hash_only() {
        let state = FileState::new_pending("a.rs", 0, "hash1");
        assert!(state.has_changed("hash2"));
        assert!(!state.has_changed("hash1"));
    }
}
