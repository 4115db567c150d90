//! C5 Annotation Generator boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Annotation, AstNode};

/// Shared context a generator may consult while annotating a file's
/// nodes.
#[derive(Debug, Clone)]
pub struct AnnotationContext {
    /// Path of the file being annotated.
    pub file_path: String,
    /// Detected language, used to pick templates.
    pub language: String,
    /// Full source text of the file.
    pub source_text: String,
    /// Every node extracted from the file, for cross-node context (e.g.
    /// doc comments attached to a sibling).
    pub all_nodes: Vec<AstNode>,
    /// Imports visible in the file.
    pub imports: Vec<String>,
    /// Exports declared in the file.
    pub exports: Vec<String>,
}

/// Which nodes a run of the generator should (re)process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationMode {
    /// Reprocess every node regardless of existing annotations.
    Force,
    /// Reprocess files whose first N nodes have missing/stale
    /// annotations (N=5 by default).
    Changed,
    /// Reprocess files with any unannotated node, probing the first 10
    /// nodes. Default mode.
    Missing,
}

impl Default for AnnotationMode {
    fn default() -> Self {
        Self::Missing
    }
}

/// How many leading nodes [`AnnotationMode::Changed`] inspects.
pub const CHANGED_MODE_PROBE_COUNT: usize = 5;
/// How many leading nodes [`AnnotationMode::Missing`] inspects.
pub const MISSING_MODE_PROBE_COUNT: usize = 10;

/// Derives a signature, summary and quality score for an [`AstNode`].
#[async_trait]
pub trait AnnotationGenerator: Send + Sync {
    /// Annotate a single node given its file-level context.
    async fn annotate(&self, node: &AstNode, context: &AnnotationContext) -> Result<Annotation>;
}
