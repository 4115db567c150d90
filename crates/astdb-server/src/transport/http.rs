//! HTTP transport: a single `POST /rpc` endpoint carrying one
//! [`RequestEnvelope`]/[`ResponseEnvelope`] pair per call, plus a liveness
//! probe.

use std::sync::Arc;

use astdb_domain::ports::query_server::{RequestEnvelope, ResponseEnvelope};
use axum::extract::{ConnectInfo, DefaultBodyLimit, Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::server::QueryServer;

/// Build the router. `with_state` is applied here so callers only need to
/// bind it to a listener.
#[must_use]
pub fn router(server: Arc<QueryServer>) -> Router {
    let body_limit = server.config().max_message_size_bytes;
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/healthz", get(health))
        .route("/rpc", post(rpc))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(server)
}

pub(crate) async fn health() -> StatusCode {
    StatusCode::OK
}

/// Bind `addr` and serve `server` until the process is signalled to stop.
pub async fn serve(addr: std::net::SocketAddr, server: Arc<QueryServer>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let app = router(server).into_make_service_with_connect_info::<std::net::SocketAddr>();
    axum::serve(listener, app).await
}

async fn rpc(
    State(server): State<Arc<QueryServer>>,
    ConnectInfo(peer): ConnectInfo<std::net::SocketAddr>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Json<ResponseEnvelope> {
    let request: Result<RequestEnvelope, _> = serde_json::from_slice(&body);
    let auth_header = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let client_key = peer.ip().to_string();

    match request {
        Ok(request) => {
            let id = request.id.clone();
            Json(server.handle_request(id, body.len(), auth_header, &client_key, request).await)
        }
        Err(e) => Json(ResponseEnvelope {
            id: Uuid::new_v4().to_string(),
            result: None,
            error: Some(astdb_domain::ports::query_server::ResponseError {
                code: "protocol".to_string(),
                message: format!("malformed request body: {e}"),
                data: None,
            }),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::DefaultQueryHandler;
    use astdb_domain::error::Result;
    use astdb_domain::model::{EmbeddingVector, QueryResult, VectorMetadata};
    use astdb_domain::ports::embedding_provider::EmbeddingProvider;
    use astdb_domain::ports::vector_store::{BatchInsertOutcome, VectorStore, VectorStoreStats, VectorStoreStatus};
    use astdb_infrastructure::QueryServerConfig;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::atomic::AtomicU8;
    use tower::ServiceExt;

    struct EmptyStore;

    #[async_trait]
    impl VectorStore for EmptyStore {
        async fn insert_vector(&self, _: &str, _: Vec<f32>, _: VectorMetadata) -> Result<()> {
            Ok(())
        }
        async fn insert_vectors(&self, _: Vec<EmbeddingVector>) -> Result<BatchInsertOutcome> {
            Ok(BatchInsertOutcome { inserted_ids: vec![], errors: vec![] })
        }
        async fn search_similar(&self, _: &[f32], _: usize, _: Option<usize>) -> Result<Vec<QueryResult>> {
            Ok(vec![])
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
                vector_count: 0,
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

    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn encode(&self, texts: &[String], _max_batch: usize) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0]).collect())
        }
        fn dimension(&self) -> usize {
            1
        }
        fn model_id(&self) -> &str {
            "stub"
        }
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let app: Router = router(Arc::new(QueryServer::new(
            Arc::new(DefaultQueryHandler::new(Arc::new(EmptyStore), Arc::new(StubEmbedder), 10, 50, Arc::new(AtomicU8::new(1)))),
            QueryServerConfig::default(),
            Arc::new(AtomicU8::new(1)),
        )));
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
