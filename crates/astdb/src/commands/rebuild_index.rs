//! `astdb rebuild-index`: recompute the HNSW graph from the vector
//! store's metadata sidecar, optionally writing it under a different
//! directory.

use std::path::{Path, PathBuf};

use astdb_domain::error::Result;
use astdb_domain::ports::vector_store::VectorStore;
use astdb_infrastructure::AstdbLayout;

use crate::wiring;

pub async fn run(workspace: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    let layout = AstdbLayout::new(workspace);
    layout.ensure().await?;

    let index_file = output_dir.as_ref().map(|dir| dir.join("hnsw.index"));
    let embedder = wiring::build_embedder()?;
    let vector_store = wiring::build_vector_store(&layout, embedder.dimension(), index_file.as_deref()).await?;

    vector_store.rebuild().await?;
    let stats = vector_store.get_stats().await?;

    println!(
        "{}",
        serde_json::json!({
            "vectorCount": stats.vector_count,
            "indexFileSizeBytes": stats.index_file_size_bytes,
            "buildTimeMs": stats.build_time_ms,
        })
    );
    Ok(())
}
