//! Search query and result types for the query server (spec §4.C10).

use serde::{Deserialize, Serialize};

use super::embedding::VectorMetadata;

/// A similarity search request against the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The query embedding, must match the index's configured dimension.
    pub query_vector: Vec<f32>,
    /// Number of results to return.
    pub k: usize,
    /// HNSW search-time candidate-list size; larger values trade latency
    /// for recall. Defaults to the vector store's configured value when
    /// absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ef: Option<usize>,
}

impl Query {
    /// Build a query for the top `k` matches of `query_vector`.
    #[must_use]
    pub fn new(query_vector: Vec<f32>, k: usize) -> Self {
        Self {
            query_vector,
            k,
            ef: None,
        }
    }
}

/// A single scored match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Id of the matched node.
    pub node_id: String,
    /// Similarity score; higher is more similar, results are ordered
    /// descending by this field.
    pub score: f32,
    /// The match's sidecar metadata.
    pub metadata: VectorMetadata,
}

/// Returns true iff `results` is sorted best-first by score, descending.
#[must_use]
pub fn is_ordered_best_first(results: &[QueryResult]) -> bool {
    results.windows(2).all(|pair| pair[0].score >= pair[1].score)
}
