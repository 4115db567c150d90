//! C10 Query Server boundary: the request/response contract, independent
//! of whatever transport (stdio, websocket, http) frames it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::model::QueryResult;

/// A single line-delimited request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Caller-chosen correlation id, echoed back on the response.
    pub id: String,
    /// Method name: `index_status`, `list_tools`, or `search`.
    pub method: String,
    /// Method-specific parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Structured error payload for a failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    /// A stable error code, e.g. `"overloaded"`, `"timeout"`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional machine-readable detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A single line-delimited response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Echoes the request's id.
    pub id: String,
    /// Present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present on failure; exactly one of `result`/`error` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

/// `index_status` result payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Number of vectors currently indexed.
    pub vector_count: usize,
    /// Unix epoch milliseconds of the last save, if any.
    pub last_saved: Option<u64>,
    /// Server lifecycle status.
    pub status: String,
}

/// `list_tools` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

/// `search` parameters; exactly one of `query`/`query_vector` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free-text query, embedded server-side before searching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// A pre-computed query embedding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_vector: Option<Vec<f32>>,
    /// Number of results to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
    /// HNSW search-time candidate-list size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ef: Option<usize>,
}

/// Server-side lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerLifecycle {
    /// Performing startup.
    Starting,
    /// Accepting requests.
    Running,
    /// No longer accepting new requests, finishing in-flight ones.
    Draining,
    /// Fully stopped.
    Stopped,
    /// Hit an unrecoverable error.
    Error,
}

/// Handles the method dispatch for one logical connection. Transport
/// framing (stdio/websocket/http line splitting, auth, rate limiting,
/// backpressure) lives outside this trait; implementors only resolve a
/// parsed [`RequestEnvelope`] into a [`ResponseEnvelope`].
#[async_trait]
pub trait QueryRequestHandler: Send + Sync {
    /// Current index status.
    async fn index_status(&self) -> Result<IndexStatus>;

    /// Available tool descriptors.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Run a similarity search, embedding `params.query` first if
    /// `query_vector` was not supplied directly.
    async fn search(&self, params: SearchParams) -> Result<Vec<QueryResult>>;
}
