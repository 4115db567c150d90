//! Dependency injection for [`crate::coordinator::PipelineCoordinator`].

use std::path::PathBuf;
use std::sync::Arc;

use astdb_domain::ports::annotation_generator::AnnotationGenerator;
use astdb_domain::ports::embedding_provider::EmbeddingProvider;
use astdb_domain::ports::parser::ParserOrchestrator;
use astdb_domain::ports::vector_store::VectorStore;
use astdb_domain::ports::watch_state::WatchStateManager;

/// Every port the coordinator drives, plus the handful of filesystem paths
/// it writes parsed/annotated output to.
pub struct PipelineDeps {
    /// C4.
    pub parser: Arc<dyn ParserOrchestrator>,
    /// C5.
    pub annotator: Arc<dyn AnnotationGenerator>,
    /// C6.
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// C7.
    pub vector_store: Arc<dyn VectorStore>,
    /// C8.
    pub watch_state: Arc<dyn WatchStateManager>,
    /// `.astdb/asts/` — parsed AST output directory.
    pub asts_dir: PathBuf,
    /// `.astdb/annots/` — annotation output directory.
    pub annots_dir: PathBuf,
    /// Micro-batch size passed through to [`EmbeddingProvider::encode`].
    pub embed_max_batch: usize,
}
