//! End-to-end exercise of a transport: the HTTP router wired to a real
//! [`QueryServer`], driven with `tower::ServiceExt::oneshot` the way the
//! teacher's own server test suites drive axum routers.

use std::sync::Arc;
use std::sync::atomic::AtomicU8;

use astdb_domain::error::Result;
use astdb_domain::model::{EmbeddingVector, QueryResult, VectorMetadata};
use astdb_domain::ports::embedding_provider::EmbeddingProvider;
use astdb_domain::ports::vector_store::{BatchInsertOutcome, VectorStore, VectorStoreStats, VectorStoreStatus};
use astdb_infrastructure::QueryServerConfig;
use astdb_server::transport::http;
use astdb_server::{DefaultQueryHandler, QueryServer};
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

struct OneResultStore;

#[async_trait]
impl VectorStore for OneResultStore {
    async fn insert_vector(&self, _: &str, _: Vec<f32>, _: VectorMetadata) -> Result<()> {
        Ok(())
    }
    async fn insert_vectors(&self, _: Vec<EmbeddingVector>) -> Result<BatchInsertOutcome> {
        Ok(BatchInsertOutcome { inserted_ids: vec![], errors: vec![] })
    }
    async fn search_similar(&self, _: &[f32], _: usize, _: Option<usize>) -> Result<Vec<QueryResult>> {
        Ok(vec![QueryResult {
            node_id: "node-1".to_string(),
            score: 0.97,
            metadata: VectorMetadata {
                signature: "fn handle()".to_string(),
                summary: "handles a request".to_string(),
                file_id: "handler.rs".to_string(),
                file_path: "src/handler.rs".to_string(),
                line_number: 12,
                confidence: 0.8,
                last_updated: 0,
            },
        }])
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
            vector_count: 1,
            memory_usage_bytes: 0,
            index_file_size_bytes: 0,
            storage_file_size_bytes: 0,
            last_saved: None,
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

struct IdentityEmbedder;

#[async_trait]
impl EmbeddingProvider for IdentityEmbedder {
    async fn encode(&self, texts: &[String], _max_batch: usize) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0]).collect())
    }
    fn dimension(&self) -> usize {
        1
    }
    fn model_id(&self) -> &str {
        "identity"
    }
}

fn app() -> axum::Router {
    let lifecycle = Arc::new(AtomicU8::new(1));
    let handler = Arc::new(DefaultQueryHandler::new(
        Arc::new(OneResultStore),
        Arc::new(IdentityEmbedder),
        10,
        50,
        Arc::clone(&lifecycle),
    ));
    let server = Arc::new(QueryServer::new(handler, QueryServerConfig::default(), lifecycle));
    http::router(server)
}

fn rpc_request(body: serde_json::Value) -> Request<Body> {
    let peer: std::net::SocketAddr = ([127, 0, 0, 1], 0).into();
    let mut request = Request::builder()
        .method("POST")
        .uri("/rpc")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

#[tokio::test]
async fn healthz_endpoint_is_reachable() {
    let response = app().oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn rpc_endpoint_round_trips_a_search_request() {
    let body = serde_json::json!({
        "id": "req-1",
        "method": "search",
        "params": { "query": "handler", "k": 1 },
    });
    let response = app().oneshot(rpc_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope["id"], "req-1");
    assert!(envelope["error"].is_null());
    assert_eq!(envelope["result"][0]["node_id"], "node-1");
}

#[tokio::test]
async fn rpc_endpoint_reports_protocol_error_for_malformed_json() {
    let peer: std::net::SocketAddr = ([127, 0, 0, 1], 0).into();
    let mut request = Request::builder()
        .method("POST")
        .uri("/rpc")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    let response = app().oneshot(request).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope["error"]["code"], "protocol");
}
