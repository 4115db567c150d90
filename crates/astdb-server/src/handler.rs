//! Default [`QueryRequestHandler`] wiring a vector store and an embedding
//! provider behind the C10 method set.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use astdb_domain::error::{Error, Result};
use astdb_domain::model::QueryResult;
use astdb_domain::ports::embedding_provider::EmbeddingProvider;
use astdb_domain::ports::query_server::{
    IndexStatus, QueryRequestHandler, SearchParams, ServerLifecycle, ToolDescriptor,
};
use astdb_domain::ports::vector_store::VectorStore;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn lifecycle_name(state: ServerLifecycle) -> &'static str {
    match state {
        ServerLifecycle::Starting => "starting",
        ServerLifecycle::Running => "running",
        ServerLifecycle::Draining => "draining",
        ServerLifecycle::Stopped => "stopped",
        ServerLifecycle::Error => "error",
    }
}

/// JSON-schema description of the `search` tool's parameters, surfaced to
/// `list_tools` so MCP-style clients can validate calls before sending them.
#[derive(Serialize, Deserialize, JsonSchema)]
#[allow(dead_code)]
struct SearchToolParams {
    /// Free-text query; embedded server-side when `query_vector` is absent.
    query: Option<String>,
    /// A pre-computed query embedding.
    query_vector: Option<Vec<f32>>,
    /// Number of results to return.
    k: Option<usize>,
    /// HNSW search-time candidate-list size.
    ef: Option<usize>,
}

/// Resolves `index_status`/`list_tools`/`search` against the real vector
/// store and embedding provider. Holds no transport or concurrency state;
/// [`crate::server::QueryServer`] layers that on top.
pub struct DefaultQueryHandler {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    default_k: usize,
    max_k: usize,
    lifecycle: Arc<AtomicU8>,
}

impl DefaultQueryHandler {
    /// Build a handler over the given store/embedder, capping `search`'s
    /// result count at `max_k` and defaulting to `default_k` when the
    /// caller omits one.
    #[must_use]
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        default_k: usize,
        max_k: usize,
        lifecycle: Arc<AtomicU8>,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            default_k,
            max_k,
            lifecycle,
        }
    }

    fn lifecycle(&self) -> ServerLifecycle {
        match self.lifecycle.load(Ordering::Acquire) {
            0 => ServerLifecycle::Starting,
            1 => ServerLifecycle::Running,
            2 => ServerLifecycle::Draining,
            3 => ServerLifecycle::Stopped,
            _ => ServerLifecycle::Error,
        }
    }
}

#[async_trait]
impl QueryRequestHandler for DefaultQueryHandler {
    async fn index_status(&self) -> Result<IndexStatus> {
        let stats = self.vector_store.get_stats().await?;
        Ok(IndexStatus {
            vector_count: stats.vector_count,
            last_saved: stats.last_saved,
            status: lifecycle_name(self.lifecycle()).to_string(),
        })
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let schema = schemars::schema_for!(SearchToolParams);
        let schema_json = serde_json::to_string(&schema).unwrap_or_else(|_| "{}".to_string());
        Ok(vec![
            ToolDescriptor {
                name: "search".to_string(),
                description: format!(
                    "Similarity search over indexed AST nodes. Input schema: {schema_json}"
                ),
            },
            ToolDescriptor {
                name: "index_status".to_string(),
                description: "Current vector count, last save time and server status.".to_string(),
            },
        ])
    }

    async fn search(&self, params: SearchParams) -> Result<Vec<QueryResult>> {
        let has_query = params.query.as_ref().is_some_and(|q| !q.is_empty());
        let has_vector = params.query_vector.is_some();
        if has_query == has_vector {
            return Err(Error::validation(
                "search requires exactly one of `query` or `query_vector`",
            ));
        }

        let vector = match params.query_vector {
            Some(v) => v,
            None => {
                let text = params.query.expect("has_query checked above");
                let mut vectors = self.embedder.encode(std::slice::from_ref(&text), 1).await?;
                vectors
                    .pop()
                    .ok_or_else(|| Error::embedding("embedding provider returned no vector for query"))?
            }
        };

        let k = params.k.unwrap_or(self.default_k).min(self.max_k).max(1);
        self.vector_store.search_similar(&vector, k, params.ef).await
    }
}
