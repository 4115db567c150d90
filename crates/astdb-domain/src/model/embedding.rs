//! Embedding vectors and their metadata sidecar.

use serde::{Deserialize, Serialize};

/// Metadata stored alongside a vector in the HNSW sidecar, so search
/// results can be rendered without a join back to the AST store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMetadata {
    /// The node's rendered signature at embedding time.
    pub signature: String,
    /// The node's summary at embedding time.
    pub summary: String,
    /// Id of the owning file.
    pub file_id: String,
    /// Path of the owning file, relative to the workspace root.
    pub file_path: String,
    /// 1-based line number of the node's start.
    pub line_number: u32,
    /// Annotation confidence this embedding was derived from.
    pub confidence: f64,
    /// Unix epoch milliseconds of the last update, supplied by the caller.
    pub last_updated: u64,
}

/// A single node's embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingVector {
    /// Id of the node this vector represents.
    pub node_id: String,
    /// The embedding, always length `D` for a given index (checked by the
    /// vector store on insert, see spec §4.C7).
    pub vector: Vec<f32>,
    /// Sidecar metadata.
    pub metadata: VectorMetadata,
}

impl EmbeddingVector {
    /// The vector's dimensionality.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    /// L2 norm of the vector.
    #[must_use]
    pub fn norm(&self) -> f32 {
        self.vector.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Returns a copy of this vector, L2-normalized for cosine similarity
    /// via inner product. A zero vector is returned unchanged.
    #[must_use]
    pub fn normalized(&self) -> Vec<f32> {
        let norm = self.norm();
        if norm == 0.0 {
            return self.vector.clone();
        }
        self.vector.iter().map(|v| v / norm).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(vector: Vec<f32>) -> EmbeddingVector {
        EmbeddingVector {
            node_id: "abc".into(),
            vector,
            metadata: VectorMetadata {
                signature: "fn foo()".into(),
                summary: "does foo".into(),
                file_id: "f1".into(),
                file_path: "src/lib.rs".into(),
                line_number: 1,
                confidence: 0.9,
                last_updated: 0,
            },
        }
    }

    #[test]
    fn normalized_vector_has_unit_norm() {
        let v = sample(vec![3.0, 4.0]);
        let normalized = v.normalized();
        let norm: f32 = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_normalizes_to_itself() {
        let v = sample(vec![0.0, 0.0]);
        assert_eq!(v.normalized(), vec![0.0, 0.0]);
    }

    #[test]
    fn dimension_matches_vector_length() {
        let v = sample(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.dimension(), 3);
    }
}
