//! Dependency injection: builds the concrete C4-C8 providers a command
//! needs from an [`AstdbLayout`], the one place that ties domain ports to
//! `astdb-providers`/`astdb-infrastructure` implementations.

use std::sync::Arc;

use astdb_application::PipelineDeps;
use astdb_domain::error::Result;
use astdb_domain::ports::embedding_provider::EmbeddingProvider;
use astdb_domain::ports::vector_store::{VectorStore, VectorStoreConfig};
use astdb_domain::ports::watch_state::WatchStateManager;
use astdb_domain::value_objects::VectorSpace;
use astdb_infrastructure::{AstdbLayout, JsonWatchStateManager, WatchConfig};
use astdb_providers::{EdgevecVectorStore, FastEmbedProvider, HeuristicAnnotationGenerator, TreeSitterParserOrchestrator, DEFAULT_MODEL_ID};

/// HNSW graph sizing, fixed for every workspace this CLI manages; large
/// enough for a sizeable repository without requiring a `--max-elements`
/// flag nobody would tune correctly by hand.
const DEFAULT_MAX_ELEMENTS: usize = 100_000;
const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_SAVE_INTERVAL_SECS: u64 = 30;

/// Load the local embedding model.
pub fn build_embedder() -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder = FastEmbedProvider::new(DEFAULT_MODEL_ID, VectorSpace::Cosine)?;
    Ok(Arc::new(embedder))
}

/// Open the HNSW vector store at the layout's configured paths,
/// overriding the index file when `index_file_override` is set (used by
/// `rebuild-index --output-dir`).
pub async fn build_vector_store(
    layout: &AstdbLayout,
    dimensions: usize,
    index_file_override: Option<&std::path::Path>,
) -> Result<Arc<dyn VectorStore>> {
    let index_file = index_file_override
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| layout.hnsw_index().to_string_lossy().into_owned());

    let config = VectorStoreConfig {
        dimensions,
        max_elements: DEFAULT_MAX_ELEMENTS,
        m: DEFAULT_M,
        ef_construction: DEFAULT_EF_CONSTRUCTION,
        space: VectorSpace::Cosine,
        storage_file: layout.vectors_db().to_string_lossy().into_owned(),
        index_file,
        auto_save: true,
        save_interval_secs: DEFAULT_SAVE_INTERVAL_SECS,
    };
    let store = EdgevecVectorStore::open(config).await?;
    Ok(Arc::new(store))
}

/// Open the workspace's persisted watch state, merging `glob`/`batch_size`
/// into its config when they differ from the stored one.
pub async fn build_watch_state(
    layout: &AstdbLayout,
    glob: Vec<String>,
    batch_size: usize,
) -> Result<Arc<JsonWatchStateManager>> {
    let default_config = WatchConfig {
        glob,
        debounce_ms: WatchConfig::default().debounce_ms,
        batch_size,
    };
    let manager = JsonWatchStateManager::open(layout.watch_state_file(), default_config).await?;
    if let Some(warning) = &manager.load_warning {
        tracing::warn!(%warning, "watch state loaded with a recoverable warning");
    }
    Ok(Arc::new(manager))
}

/// Assemble every port [`astdb_application::PipelineCoordinator`] needs,
/// for a workspace rooted at `layout`, reusing an already-opened
/// `watch_state` so callers that needed it earlier (e.g. to resolve
/// [`astdb_domain::value_objects::QuerySelection::Config`]) don't pay to
/// open it twice.
pub async fn build_pipeline_deps(
    layout: &AstdbLayout,
    watch_state: Arc<dyn WatchStateManager>,
    embed_max_batch: usize,
) -> Result<PipelineDeps> {
    let embedder = build_embedder()?;
    let vector_store = build_vector_store(layout, embedder.dimension(), None).await?;

    Ok(PipelineDeps {
        parser: Arc::new(TreeSitterParserOrchestrator::new()),
        annotator: Arc::new(HeuristicAnnotationGenerator::new()),
        embedder,
        vector_store,
        watch_state,
        asts_dir: layout.asts_dir(),
        annots_dir: layout.annots_dir(),
        embed_max_batch,
    })
}
