//! `astdb embed`: run the full parse -> annotate -> embed+index pipeline
//! over an explicit file list.
//!
//! The coordinator fuses a file's parse and annotate stages into its
//! embed step rather than re-embedding previously written annotations, so
//! this command always reprocesses every named file from scratch instead
//! of assuming `asts/`/`annots/` output from an earlier `parse`/`annotate`
//! run is still fresh.

use std::path::Path;

use astdb_application::{PipelineCoordinator, PipelineStage};
use astdb_domain::error::Result;
use astdb_infrastructure::AstdbLayout;

use crate::wiring;

pub async fn run(workspace: &Path, files: Vec<String>) -> Result<()> {
    let layout = AstdbLayout::new(workspace);
    layout.ensure().await?;

    let watch_state = wiring::build_watch_state(&layout, Vec::new(), files.len().max(1)).await?;
    let deps = wiring::build_pipeline_deps(&layout, watch_state, files.len().max(1)).await?;
    let coordinator = PipelineCoordinator::new(deps);
    let outcome = coordinator.run_batch(&files, true, None, PipelineStage::Embed).await?;

    println!(
        "{}",
        serde_json::json!({
            "filesProcessed": outcome.files_processed,
            "errors": outcome.errors,
            "durationMs": outcome.duration_ms,
        })
    );
    Ok(())
}
