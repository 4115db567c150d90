//! HNSW-backed [`VectorStore`] implementation: `edgevec` graph plus a
//! metadata sidecar, single-writer/multi-reader.

mod graph;
mod sidecar;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use astdb_domain::error::{Error, Result};
use astdb_domain::model::{EmbeddingVector, QueryResult, VectorMetadata};
use astdb_domain::ports::vector_store::{
    BatchInsertOutcome, VectorStore, VectorStoreConfig, VectorStoreStats, VectorStoreStatus,
};
use async_trait::async_trait;

use graph::HnswGraph;
use sidecar::MetadataSidecar;

/// Concrete [`VectorStore`] backed by `edgevec`'s HNSW graph and an
/// append-only metadata sidecar.
///
/// Writes go sidecar-first: the sidecar append is durable before the graph
/// insert runs, so a crash between the two leaves only a graph that is
/// behind the sidecar, repaired by [`VectorStore::rebuild`].
pub struct EdgevecVectorStore {
    config: VectorStoreConfig,
    graph: HnswGraph,
    sidecar: MetadataSidecar,
    search_count: AtomicU64,
    search_time_ms_total: AtomicU64,
    last_saved_ms: Mutex<Option<u64>>,
    build_time_ms: Mutex<Option<u64>>,
}

impl EdgevecVectorStore {
    /// Open (or create) a store at the paths named by `config`.
    pub async fn open(config: VectorStoreConfig) -> Result<Self> {
        config.validate()?;
        let graph = HnswGraph::open(
            &config.index_file,
            config.dimensions,
            config.max_elements,
            config.m,
            config.ef_construction,
            config.space,
        )?;
        let sidecar = MetadataSidecar::open(&config.storage_file).await?;

        // The sidecar is the source of truth; repair the graph if it is
        // behind (e.g. after a crash between sidecar append and graph
        // insert).
        let store = Self {
            config,
            graph,
            sidecar,
            search_count: AtomicU64::new(0),
            search_time_ms_total: AtomicU64::new(0),
            last_saved_ms: Mutex::new(None),
            build_time_ms: Mutex::new(None),
        };
        if store.graph.len()? != store.sidecar.len() {
            store.rebuild().await?;
        }
        Ok(store)
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.config.dimensions {
            return Err(Error::vector_store(format!(
                "Vector dimensions mismatch: expected {}, got {}",
                self.config.dimensions,
                vector.len()
            )));
        }
        Ok(())
    }

    async fn maybe_autosave(&self) -> Result<()> {
        if !self.config.auto_save {
            return Ok(());
        }
        self.graph.save().await?;
        *self
            .last_saved_ms
            .lock()
            .map_err(|_| Error::vector_store("last_saved lock poisoned"))? =
            Some(now_ms());
        Ok(())
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[async_trait]
impl VectorStore for EdgevecVectorStore {
    async fn insert_vector(
        &self,
        node_id: &str,
        vector: Vec<f32>,
        metadata: VectorMetadata,
    ) -> Result<()> {
        if node_id.is_empty() {
            return Err(Error::validation("node_id must not be empty"));
        }
        if vector.is_empty() {
            return Err(Error::validation("vector must not be empty"));
        }
        self.check_dimensions(&vector)?;

        self.sidecar.upsert(node_id, vector.clone(), metadata).await?;
        self.graph.upsert(node_id, &vector)?;
        self.maybe_autosave().await?;
        Ok(())
    }

    async fn insert_vectors(&self, batch: Vec<EmbeddingVector>) -> Result<BatchInsertOutcome> {
        let mut inserted_ids = Vec::with_capacity(batch.len());
        let mut errors = Vec::new();

        for (index, item) in batch.into_iter().enumerate() {
            match self
                .insert_vector(&item.node_id, item.vector, item.metadata)
                .await
            {
                Ok(()) => inserted_ids.push(item.node_id.clone()),
                Err(err) => errors.push((index, err)),
            }
        }

        Ok(BatchInsertOutcome {
            inserted_ids,
            errors,
        })
    }

    async fn search_similar(
        &self,
        query: &[f32],
        k: usize,
        ef: Option<usize>,
    ) -> Result<Vec<QueryResult>> {
        if k == 0 {
            return Err(Error::validation("k must be positive"));
        }
        if ef == Some(0) {
            return Err(Error::validation("ef must be positive when provided"));
        }
        self.check_dimensions(query)?;

        let started = std::time::Instant::now();
        let hits = self.graph.search(query, k, ef)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.search_count.fetch_add(1, Ordering::Relaxed);
        self.search_time_ms_total
            .fetch_add(elapsed_ms, Ordering::Relaxed);

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(stored) = self.sidecar.get(&hit.node_id) else {
                continue;
            };
            results.push(QueryResult {
                node_id: hit.node_id,
                score: hit.score,
                metadata: stored.metadata,
            });
        }
        Ok(results)
    }

    async fn update_vector(&self, node_id: &str, vector: Vec<f32>) -> Result<()> {
        if node_id.is_empty() {
            return Err(Error::validation("node_id must not be empty"));
        }
        self.check_dimensions(&vector)?;
        let existing = self
            .sidecar
            .get(node_id)
            .ok_or_else(|| Error::vector_store(format!("no such vector: {node_id}")))?;
        self.sidecar
            .upsert(node_id, vector.clone(), existing.metadata)
            .await?;
        self.graph.upsert(node_id, &vector)?;
        self.maybe_autosave().await?;
        Ok(())
    }

    async fn delete_vector(&self, node_id: &str) -> Result<()> {
        if node_id.is_empty() {
            return Err(Error::validation("node_id must not be empty"));
        }
        self.sidecar.delete(node_id).await?;
        self.graph.remove(node_id)?;
        self.maybe_autosave().await?;
        Ok(())
    }

    async fn rebuild(&self) -> Result<()> {
        let started = std::time::Instant::now();
        let entries = self
            .sidecar
            .snapshot()
            .into_iter()
            .map(|(node_id, stored)| (node_id, stored.vector));
        self.graph.rebuild_from(entries)?;
        self.graph.save().await?;
        let elapsed = started.elapsed().as_millis() as u64;
        *self
            .build_time_ms
            .lock()
            .map_err(|_| Error::vector_store("build_time lock poisoned"))? = Some(elapsed);
        *self
            .last_saved_ms
            .lock()
            .map_err(|_| Error::vector_store("last_saved lock poisoned"))? = Some(now_ms());
        Ok(())
    }

    async fn get_stats(&self) -> Result<VectorStoreStats> {
        let count = self.search_count.load(Ordering::Relaxed);
        let total_ms = self.search_time_ms_total.load(Ordering::Relaxed);
        let average_search_time_ms = if count == 0 {
            0.0
        } else {
            total_ms as f64 / count as f64
        };

        Ok(VectorStoreStats {
            vector_count: self.sidecar.len(),
            memory_usage_bytes: (self.sidecar.len() * self.config.dimensions * 4) as u64,
            index_file_size_bytes: self.graph.file_size_bytes(),
            storage_file_size_bytes: self.sidecar.file_size_bytes().await?,
            last_saved: *self
                .last_saved_ms
                .lock()
                .map_err(|_| Error::vector_store("last_saved lock poisoned"))?,
            build_time_ms: *self
                .build_time_ms
                .lock()
                .map_err(|_| Error::vector_store("build_time lock poisoned"))?,
            average_search_time_ms,
            status: VectorStoreStatus::Ready,
            error_message: None,
        })
    }

    async fn shutdown(&self) -> Result<()> {
        self.graph.save().await
    }
}
