//! Thin wrapper over the `edgevec` HNSW crate.
//!
//! The rest of the store only sees [`HnswGraph`]; all `edgevec` types stop
//! at this module's boundary so a future crate upgrade touches one file.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use astdb_domain::error::{Error, Result};
use astdb_domain::value_objects::VectorSpace;
use edgevec::{Hnsw, HnswParams, Metric};

fn to_edgevec_metric(space: VectorSpace) -> Metric {
    match space {
        VectorSpace::Cosine => Metric::Cosine,
        VectorSpace::L2 => Metric::Euclidean,
        VectorSpace::InnerProduct => Metric::InnerProduct,
    }
}

/// A single match from the graph, before sidecar metadata is joined in.
#[derive(Debug, Clone)]
pub struct GraphHit {
    /// Stable vector id as stored at insert time.
    pub node_id: String,
    /// Similarity/distance score in the store's configured space.
    pub score: f32,
}

/// HNSW graph snapshot, swapped atomically on rebuild so in-flight reads
/// never observe a half-built index.
pub struct HnswGraph {
    index_file: PathBuf,
    dimensions: usize,
    max_elements: usize,
    m: usize,
    ef_construction: usize,
    space: VectorSpace,
    inner: RwLock<Hnsw<String>>,
}

impl HnswGraph {
    /// Open the graph file if present, otherwise start an empty index.
    pub fn open(
        index_file: impl AsRef<Path>,
        dimensions: usize,
        max_elements: usize,
        m: usize,
        ef_construction: usize,
        space: VectorSpace,
    ) -> Result<Self> {
        let index_file = index_file.as_ref().to_path_buf();
        let params = HnswParams {
            dimensions,
            max_elements,
            m,
            ef_construction,
            metric: to_edgevec_metric(space),
        };

        let hnsw = if index_file.exists() {
            Hnsw::load(&index_file, params)
                .map_err(|e| Error::vector_store(format!("failed to load HNSW index: {e}")))?
        } else {
            Hnsw::new(params)
        };

        Ok(Self {
            index_file,
            dimensions,
            max_elements,
            m,
            ef_construction,
            space,
            inner: RwLock::new(hnsw),
        })
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, Hnsw<String>>> {
        self.inner
            .write()
            .map_err(|_| Error::vector_store("HNSW graph lock poisoned"))
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, Hnsw<String>>> {
        self.inner
            .read()
            .map_err(|_| Error::vector_store("HNSW graph lock poisoned"))
    }

    /// Insert or update one labeled vector.
    pub fn upsert(&self, node_id: &str, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::vector_store(format!(
                "Vector dimensions mismatch: expected {}, got {}",
                self.dimensions,
                vector.len()
            ))
            .with_context("node_id", node_id));
        }
        self.write_lock()?
            .insert(node_id.to_string(), vector)
            .map_err(|e| Error::vector_store(format!("HNSW insert failed: {e}")))
    }

    /// Remove a labeled vector, if present.
    pub fn remove(&self, node_id: &str) -> Result<()> {
        self.write_lock()?.remove(node_id);
        Ok(())
    }

    /// Query the `k` nearest neighbors, deterministically breaking ties on
    /// ascending `node_id`.
    pub fn search(&self, query: &[f32], k: usize, ef: Option<usize>) -> Result<Vec<GraphHit>> {
        if query.len() != self.dimensions {
            return Err(Error::vector_store(format!(
                "Vector dimensions mismatch: expected {}, got {}",
                self.dimensions,
                query.len()
            )));
        }
        let graph = self.read_lock()?;
        let ef = ef.unwrap_or_else(|| self.ef_construction.max(k));
        let mut hits: Vec<GraphHit> = graph
            .search(query, k, ef)
            .map_err(|e| Error::vector_store(format!("HNSW search failed: {e}")))?
            .into_iter()
            .map(|neighbor| GraphHit {
                node_id: neighbor.label,
                score: neighbor.score,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Replace the on-disk snapshot with the current in-memory graph. Writes
    /// to a `.tmp` sibling and renames over the target so a crash mid-save
    /// never leaves a truncated index file.
    pub async fn save(&self) -> Result<()> {
        let tmp = self.index_file.with_extension("tmp");
        {
            let graph = self.read_lock()?;
            graph
                .save(&tmp)
                .map_err(|e| Error::vector_store(format!("failed to save HNSW index: {e}")))?;
        }
        tokio::fs::rename(&tmp, &self.index_file)
            .await
            .map_err(Error::from)
    }

    /// Rebuild from scratch using the given (id, vector) pairs, replacing
    /// the in-memory graph atomically.
    pub fn rebuild_from(&self, entries: impl Iterator<Item = (String, Vec<f32>)>) -> Result<()> {
        let params = HnswParams {
            dimensions: self.dimensions,
            max_elements: self.max_elements,
            m: self.m,
            ef_construction: self.ef_construction,
            metric: to_edgevec_metric(self.space),
        };
        let mut fresh = Hnsw::new(params);
        for (node_id, vector) in entries {
            fresh
                .insert(node_id, &vector)
                .map_err(|e| Error::vector_store(format!("HNSW rebuild insert failed: {e}")))?;
        }
        *self.write_lock()? = fresh;
        Ok(())
    }

    /// Number of vectors currently indexed.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_lock()?.len())
    }

    /// On-disk size of the index file, or 0 if it has never been saved.
    pub fn file_size_bytes(&self) -> u64 {
        std::fs::metadata(&self.index_file)
            .map(|meta| meta.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_on_insert_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let graph = HnswGraph::open(
            dir.path().join("index.hnsw"),
            4,
            1000,
            16,
            200,
            VectorSpace::Cosine,
        )
        .unwrap();
        let err = graph.upsert("n1", &[1.0, 2.0]).unwrap_err();
        assert_eq!(err.kind.as_str(), "vectorStore");
    }

    #[test]
    fn search_orders_by_descending_score_then_node_id() {
        let dir = tempfile::tempdir().unwrap();
        let graph = HnswGraph::open(
            dir.path().join("index.hnsw"),
            2,
            1000,
            16,
            200,
            VectorSpace::Cosine,
        )
        .unwrap();
        graph.upsert("b", &[1.0, 0.0]).unwrap();
        graph.upsert("a", &[1.0, 0.0]).unwrap();
        let hits = graph.search(&[1.0, 0.0], 2, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node_id, "a");
    }
}
