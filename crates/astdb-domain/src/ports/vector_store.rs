//! C7 Vector Store + HNSW Index boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{EmbeddingVector, QueryResult, VectorMetadata};
use crate::value_objects::VectorSpace;

/// Store-wide configuration, validated at construction time: all numeric
/// fields must be positive, `dimensions > 0`, paths non-empty, `m <= 100`
/// and `ef_construction >= m`.
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    /// Vector dimensionality, fixed for the lifetime of the store.
    pub dimensions: usize,
    /// Maximum number of elements the graph is sized for.
    pub max_elements: usize,
    /// HNSW `M` parameter, in `[1, 100]`.
    pub m: usize,
    /// HNSW `efConstruction`, must be `>= m`.
    pub ef_construction: usize,
    /// Distance/similarity space.
    pub space: VectorSpace,
    /// Path of the metadata sidecar.
    pub storage_file: String,
    /// Path of the HNSW graph snapshot.
    pub index_file: String,
    /// Whether to periodically flush to disk.
    pub auto_save: bool,
    /// Seconds between auto-saves; must be positive.
    pub save_interval_secs: u64,
}

impl VectorStoreConfig {
    /// Validate the invariants from spec §4.C7, returning the first
    /// violation found.
    pub fn validate(&self) -> Result<()> {
        use crate::error::Error;
        if self.dimensions == 0 {
            return Err(Error::validation("dimensions must be positive"));
        }
        if self.max_elements == 0 {
            return Err(Error::validation("max_elements must be positive"));
        }
        if self.m == 0 || self.m > 100 {
            return Err(Error::validation("m must be in [1, 100]"));
        }
        if self.ef_construction < self.m {
            return Err(Error::validation("ef_construction must be >= m"));
        }
        if self.storage_file.is_empty() || self.index_file.is_empty() {
            return Err(Error::validation("storage_file and index_file must be non-empty"));
        }
        if self.save_interval_secs == 0 {
            return Err(Error::validation("save_interval_secs must be positive"));
        }
        Ok(())
    }
}

/// Liveness/build status of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorStoreStatus {
    /// Accepting reads and writes.
    Ready,
    /// A rebuild is in progress; reads still proceed against the last
    /// committed snapshot.
    Building,
    /// The store has hit an unrecoverable error.
    Error,
}

/// Point-in-time statistics (spec §4.C7 `getStats`).
#[derive(Debug, Clone)]
pub struct VectorStoreStats {
    /// Number of vectors currently stored.
    pub vector_count: usize,
    /// Approximate resident memory, in bytes.
    pub memory_usage_bytes: u64,
    /// On-disk size of the HNSW graph file.
    pub index_file_size_bytes: u64,
    /// On-disk size of the metadata sidecar.
    pub storage_file_size_bytes: u64,
    /// Unix epoch milliseconds of the last successful flush.
    pub last_saved: Option<u64>,
    /// Milliseconds the last full rebuild took.
    pub build_time_ms: Option<u64>,
    /// Rolling average search latency, in milliseconds.
    pub average_search_time_ms: f64,
    /// Current status.
    pub status: VectorStoreStatus,
    /// Error detail, set iff `status == Error`.
    pub error_message: Option<String>,
}

/// Result of a batch insert: per-item outcome, since a partial failure
/// still commits its successful prefix.
#[derive(Debug)]
pub struct BatchInsertOutcome {
    /// Ids of vectors that were inserted successfully.
    pub inserted_ids: Vec<String>,
    /// Per-item failures, aligned by original input index.
    pub errors: Vec<(usize, crate::error::Error)>,
}

/// Persistent vector store with single-writer/multi-reader HNSW search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert one vector. Rejects an empty `node_id`, an empty vector, a
    /// dimension mismatch against the store's configuration, or missing
    /// metadata. The sidecar write precedes the graph insert so a crash
    /// between the two is repaired by [`Self::rebuild`] at next open.
    async fn insert_vector(
        &self,
        node_id: &str,
        vector: Vec<f32>,
        metadata: VectorMetadata,
    ) -> Result<()>;

    /// Bulk insert with per-item error collection; a partial failure
    /// still commits the successful prefix.
    async fn insert_vectors(&self, batch: Vec<EmbeddingVector>) -> Result<BatchInsertOutcome>;

    /// Search for the `k` nearest neighbors of `query`. Rejects a
    /// dimension mismatch, `k == 0`, or `ef == Some(0)`. Results are
    /// ordered by descending similarity with ties broken by ascending
    /// `node_id`.
    async fn search_similar(
        &self,
        query: &[f32],
        k: usize,
        ef: Option<usize>,
    ) -> Result<Vec<QueryResult>>;

    /// Replace the stored vector for `node_id`. Rejects an empty id.
    async fn update_vector(&self, node_id: &str, vector: Vec<f32>) -> Result<()>;

    /// Remove `node_id` from both the sidecar and the graph. Rejects an
    /// empty id.
    async fn delete_vector(&self, node_id: &str) -> Result<()>;

    /// Recompute the HNSW graph from the sidecar, atomically replacing
    /// the index file.
    async fn rebuild(&self) -> Result<()>;

    /// Current statistics.
    async fn get_stats(&self) -> Result<VectorStoreStats>;

    /// Flush and release resources. Safe to call more than once.
    async fn shutdown(&self) -> Result<()>;
}
