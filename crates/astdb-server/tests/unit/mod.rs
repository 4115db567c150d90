//! Unit coverage for the pieces `astdb_server`'s internal `#[cfg(test)]`
//! modules can't reach: the public [`DefaultQueryHandler`]/[`QueryServer`]
//! surface exercised as an external crate would use it.

use std::sync::Arc;
use std::sync::atomic::AtomicU8;

use astdb_domain::error::Result;
use astdb_domain::model::{EmbeddingVector, QueryResult, VectorMetadata};
use astdb_domain::ports::embedding_provider::EmbeddingProvider;
use astdb_domain::ports::query_server::{QueryRequestHandler, RequestEnvelope};
use astdb_domain::ports::vector_store::{BatchInsertOutcome, VectorStore, VectorStoreStats, VectorStoreStatus};
use astdb_infrastructure::QueryServerConfig;
use astdb_server::{DefaultQueryHandler, QueryServer};
use async_trait::async_trait;

struct StaticStore;

#[async_trait]
impl VectorStore for StaticStore {
    async fn insert_vector(&self, _: &str, _: Vec<f32>, _: VectorMetadata) -> Result<()> {
        Ok(())
    }
    async fn insert_vectors(&self, _: Vec<EmbeddingVector>) -> Result<BatchInsertOutcome> {
        Ok(BatchInsertOutcome { inserted_ids: vec![], errors: vec![] })
    }
    async fn search_similar(&self, _: &[f32], k: usize, _: Option<usize>) -> Result<Vec<QueryResult>> {
        Ok((0..k)
            .map(|i| QueryResult {
                node_id: format!("n{i}"),
                score: 1.0 - i as f32 * 0.01,
                metadata: VectorMetadata {
                    signature: "fn f()".to_string(),
                    summary: "does f".to_string(),
                    file_id: "f.rs".to_string(),
                    file_path: "f.rs".to_string(),
                    line_number: 1,
                    confidence: 0.9,
                    last_updated: 0,
                },
            })
            .collect())
    }
    async fn update_vector(&self, _: &str, _: Vec<f32>) -> Result<()> {
        Ok(())
    }
    async fn delete_vector(&self, _: &str) -> Result<()> {
        Ok(())
    }
    async fn rebuild(&self) -> Result<()> {
        Ok(())
    }
    async fn get_stats(&self) -> Result<VectorStoreStats> {
        Ok(VectorStoreStats {
            vector_count: 7,
            memory_usage_bytes: 0,
            index_file_size_bytes: 0,
            storage_file_size_bytes: 0,
            last_saved: Some(100),
            build_time_ms: None,
            average_search_time_ms: 0.0,
            status: VectorStoreStatus::Ready,
            error_message: None,
        })
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

struct StaticEmbedder;

#[async_trait]
impl EmbeddingProvider for StaticEmbedder {
    async fn encode(&self, texts: &[String], _max_batch: usize) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
    fn dimension(&self) -> usize {
        2
    }
    fn model_id(&self) -> &str {
        "static"
    }
}

fn build_server(config: QueryServerConfig) -> Arc<QueryServer> {
    let lifecycle = Arc::new(AtomicU8::new(1));
    let handler = Arc::new(DefaultQueryHandler::new(
        Arc::new(StaticStore),
        Arc::new(StaticEmbedder),
        10,
        50,
        Arc::clone(&lifecycle),
    ));
    Arc::new(QueryServer::new(handler, config, lifecycle))
}

#[tokio::test]
async fn index_status_reflects_vector_store_stats() {
    let server = build_server(QueryServerConfig::default());
    let request = RequestEnvelope { id: "s1".to_string(), method: "index_status".to_string(), params: None };
    let response = server.handle_request("s1".into(), 32, None, "test", request).await;
    let result = response.result.expect("expected a result payload");
    assert_eq!(result["vectorCount"].as_u64().or_else(|| result["vector_count"].as_u64()), Some(7));
}

#[tokio::test]
async fn search_via_free_text_query_embeds_and_returns_results() {
    let server = build_server(QueryServerConfig::default());
    let params = serde_json::json!({ "query": "find the parser", "k": 3 });
    let request = RequestEnvelope { id: "s2".to_string(), method: "search".to_string(), params: Some(params) };
    let response = server.handle_request("s2".into(), 64, None, "test", request).await;
    assert!(response.error.is_none());
    let results = response.result.unwrap();
    assert_eq!(results.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn direct_handler_use_bypasses_transport_concerns() {
    let handler = DefaultQueryHandler::new(Arc::new(StaticStore), Arc::new(StaticEmbedder), 5, 5, Arc::new(AtomicU8::new(1)));
    let status = handler.index_status().await.unwrap();
    assert_eq!(status.vector_count, 7);
}
