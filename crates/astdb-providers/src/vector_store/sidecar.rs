//! Metadata sidecar: an append-only log of vector records, indexed in
//! memory by node id, backing `vectors.db`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use astdb_domain::error::{Error, Result};
use astdb_domain::model::VectorMetadata;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One append-only log entry: either an upsert or a tombstone.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum SidecarEntry {
    Upsert {
        node_id: String,
        vector: Vec<f32>,
        metadata: VectorMetadata,
    },
    Delete {
        node_id: String,
    },
}

/// A vector plus its metadata, as held in memory.
#[derive(Debug, Clone)]
pub struct StoredVector {
    /// The raw embedding.
    pub vector: Vec<f32>,
    /// Sidecar metadata.
    pub metadata: VectorMetadata,
}

/// In-memory index over the sidecar log, rebuilt by replaying the log on
/// open and appended to on every write.
pub struct MetadataSidecar {
    path: PathBuf,
    entries: DashMap<String, StoredVector>,
    file: Arc<RwLock<std::fs::File>>,
}

impl MetadataSidecar {
    /// Open (creating if absent) the sidecar at `path`, replaying any
    /// existing log into memory.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = DashMap::new();

        if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(Error::from)?;
            for line in contents.lines().filter(|l| !l.trim().is_empty()) {
                let entry: SidecarEntry = serde_json::from_str(line)?;
                match entry {
                    SidecarEntry::Upsert {
                        node_id,
                        vector,
                        metadata,
                    } => {
                        entries.insert(node_id, StoredVector { vector, metadata });
                    }
                    SidecarEntry::Delete { node_id } => {
                        entries.remove(&node_id);
                    }
                }
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(Error::from)?;

        Ok(Self {
            path,
            entries,
            file: Arc::new(RwLock::new(file)),
        })
    }

    /// Path this sidecar is backed by.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live (non-deleted) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the sidecar has no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// On-disk size of the log file, in bytes.
    pub async fn file_size_bytes(&self) -> Result<u64> {
        let meta = tokio::fs::metadata(&self.path).await.map_err(Error::from)?;
        Ok(meta.len())
    }

    /// Append an upsert and update the in-memory index.
    pub async fn upsert(&self, node_id: &str, vector: Vec<f32>, metadata: VectorMetadata) -> Result<()> {
        self.append(&SidecarEntry::Upsert {
            node_id: node_id.to_string(),
            vector: vector.clone(),
            metadata: metadata.clone(),
        })
        .await?;
        self.entries
            .insert(node_id.to_string(), StoredVector { vector, metadata });
        Ok(())
    }

    /// Append a tombstone and remove from the in-memory index.
    pub async fn delete(&self, node_id: &str) -> Result<()> {
        self.append(&SidecarEntry::Delete {
            node_id: node_id.to_string(),
        })
        .await?;
        self.entries.remove(node_id);
        Ok(())
    }

    /// Fetch a single stored vector by id.
    #[must_use]
    pub fn get(&self, node_id: &str) -> Option<StoredVector> {
        self.entries.get(node_id).map(|entry| entry.clone())
    }

    /// Snapshot of every live entry, ordered by node id for determinism.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, StoredVector> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    async fn append(&self, entry: &SidecarEntry) -> Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || {
            let mut guard = file.blocking_write();
            guard.write_all(&line)
        })
        .await
        .map_err(|e| Error::filesystem(e.to_string()))?
        .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> VectorMetadata {
        VectorMetadata {
            signature: "fn foo()".into(),
            summary: "does foo".into(),
            file_id: "f1".into(),
            file_path: "src/lib.rs".into(),
            line_number: 1,
            confidence: 0.9,
            last_updated: 0,
        }
    }

    #[tokio::test]
    async fn upsert_then_reopen_replays_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");

        {
            let sidecar = MetadataSidecar::open(&path).await.unwrap();
            sidecar
                .upsert("n1", vec![1.0, 2.0], metadata())
                .await
                .unwrap();
        }

        let reopened = MetadataSidecar::open(&path).await.unwrap();
        assert_eq!(reopened.len(), 1);
        assert!(reopened.get("n1").is_some());
    }

    #[tokio::test]
    async fn delete_removes_from_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");
        let sidecar = MetadataSidecar::open(&path).await.unwrap();
        sidecar
            .upsert("n1", vec![1.0], metadata())
            .await
            .unwrap();
        sidecar.delete("n1").await.unwrap();
        assert!(sidecar.is_empty());
    }
}
