//! C6 Embedding Engine boundary.

use async_trait::async_trait;

use crate::error::Result;

/// Maps annotation text to fixed-dimension float vectors.
///
/// Implementations must L2-normalize output when configured for a cosine
/// vector space; the output dimension is fixed per model and must match
/// the vector store's configured `dimensions`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Batch-encode `texts` into vectors, one per input, preserving
    /// order. Implementations may micro-batch internally up to
    /// `max_batch`.
    async fn encode(&self, texts: &[String], max_batch: usize) -> Result<Vec<Vec<f32>>>;

    /// The fixed output dimension this provider produces.
    fn dimension(&self) -> usize;

    /// Stable identifier of the underlying model, for error messages and
    /// sidecar provenance.
    fn model_id(&self) -> &str;
}
