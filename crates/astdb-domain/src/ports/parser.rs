//! C4 Parser Orchestrator boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::AstNode;

/// A single parse failure, attributed to a file, never aborting the
/// containing batch.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Path of the file the error occurred in.
    pub file_path: String,
    /// Human-readable description.
    pub message: String,
}

/// Per-file parse outcome.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// Classified nodes extracted from the file. Empty is legal (e.g. an
    /// empty file).
    pub nodes: Vec<AstNode>,
    /// Non-fatal per-file parse errors.
    pub errors: Vec<ParseError>,
    /// Detected source language.
    pub language: String,
    /// Wall-clock parse time in milliseconds.
    pub parse_time_ms: u64,
}

/// Batch parsing knobs.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Files per batch.
    pub batch_size: usize,
    /// Max files parsed concurrently within a batch.
    pub max_concurrency: usize,
    /// When true, parse but suppress writes to `asts/`.
    pub dry_run: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_concurrency: num_cpus_hint(),
            dry_run: false,
        }
    }
}

fn num_cpus_hint() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

/// Drives language detection, native-tree parsing, and C3 classification
/// for a batch of files.
#[async_trait]
pub trait ParserOrchestrator: Send + Sync {
    /// Parse `files`, one [`ParseOutcome`] per input path, in the same
    /// order. A failure parsing one file never aborts the batch; it is
    /// reported in that file's `errors`.
    async fn parse_batch(
        &self,
        files: &[String],
        options: ParseOptions,
    ) -> Result<Vec<ParseOutcome>>;
}
