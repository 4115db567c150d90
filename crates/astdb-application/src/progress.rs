//! Batch state machine and progress reporting for the pipeline coordinator.

/// Which stage of a batch run is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// C8 is partitioning the candidate set into changed/unchanged.
    Select,
    /// C4 parsing.
    Parse,
    /// C5 annotation.
    Annotate,
    /// C6 embedding + C7 insertion.
    EmbedIndex,
    /// C8 is persisting per-file outcomes.
    Record,
}

/// Lifecycle of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Accepted but not yet started.
    Pending,
    /// A stage is actively executing.
    Running,
    /// Every file ran to completion (individual files may still have
    /// failed; see `error_count`).
    Completed,
    /// The batch was aborted by an unrecoverable error (e.g. C7 unusable).
    Failed,
    /// The caller cancelled the run before it finished.
    Cancelled,
}

/// A point-in-time progress snapshot, reported via the coordinator's
/// progress callback at most once per file.
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    /// Files fully processed so far (success or error).
    pub completed: usize,
    /// Total files in this batch.
    pub total: usize,
    /// Path of the file currently being processed, if any.
    pub current_file: Option<String>,
    /// Files per second, averaged over the run so far.
    pub rate: f64,
    /// Estimated seconds remaining at the current rate.
    pub estimated_time_remaining_secs: Option<f64>,
    /// Approximate resident memory of the current process, in megabytes.
    pub memory_usage_mb: f64,
    /// Current stage.
    pub phase: PipelinePhase,
    /// Files that have failed so far in this run.
    pub error_count: usize,
}

impl PipelineProgress {
    pub(crate) fn estimate(
        completed: usize,
        total: usize,
        current_file: Option<String>,
        elapsed_secs: f64,
        memory_usage_mb: f64,
        phase: PipelinePhase,
        error_count: usize,
    ) -> Self {
        let rate = if elapsed_secs > 0.0 {
            completed as f64 / elapsed_secs
        } else {
            0.0
        };
        let remaining = total.saturating_sub(completed);
        let estimated_time_remaining_secs = if rate > 0.0 {
            Some(remaining as f64 / rate)
        } else {
            None
        };
        Self {
            completed,
            total,
            current_file,
            rate,
            estimated_time_remaining_secs,
            memory_usage_mb,
            phase,
            error_count,
        }
    }
}

/// Outcome of a full batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Final status; `Failed` only for a batch-aborting error, never for
    /// individual file failures (those are counted in `error_count`).
    pub status: BatchStatus,
    /// Files that completed every requested stage.
    pub files_processed: usize,
    /// Files skipped because C8 reported them unchanged.
    pub files_skipped: usize,
    /// Files that failed at some stage, with the failing file path and
    /// error message.
    pub errors: Vec<(String, String)>,
    /// Wall-clock duration of the run, in milliseconds.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_computes_rate_and_remaining() {
        let progress = PipelineProgress::estimate(
            10,
            40,
            Some("a.rs".to_string()),
            5.0,
            128.0,
            PipelinePhase::Parse,
            1,
        );
        assert_eq!(progress.rate, 2.0);
        assert_eq!(progress.estimated_time_remaining_secs, Some(15.0));
    }

    #[test]
    fn estimate_has_no_eta_at_zero_elapsed() {
        let progress =
            PipelineProgress::estimate(0, 10, None, 0.0, 64.0, PipelinePhase::Select, 0);
        assert_eq!(progress.rate, 0.0);
        assert!(progress.estimated_time_remaining_secs.is_none());
    }
}
