//! `astdb annotate`: select candidates, run stage 2 (C5) over them.

use std::path::Path;

use astdb_application::{PipelineCoordinator, PipelineStage};
use astdb_domain::error::{Error, Result};
use astdb_domain::value_objects::QuerySelection;
use astdb_infrastructure::AstdbLayout;

use crate::{selection, wiring};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    workspace: &Path,
    changed: bool,
    force: bool,
    batch_size: usize,
    max_concurrency: usize,
    dry_run: bool,
    output_stats: bool,
) -> Result<()> {
    if max_concurrency == 0 {
        return Err(Error::validation("--max-concurrency must be positive"));
    }

    let layout = AstdbLayout::new(workspace);
    layout.ensure().await?;

    let query_selection = if changed {
        QuerySelection::Changed { base: "HEAD".to_string() }
    } else {
        QuerySelection::Config
    };

    let watch_state = wiring::build_watch_state(&layout, Vec::new(), batch_size).await?;
    let config_globs = watch_state.config().await.glob;
    let candidates = selection::resolve(&query_selection, workspace, &config_globs)?;

    if dry_run {
        println!("{}", serde_json::json!({ "wouldProcess": candidates }));
        return Ok(());
    }

    let deps = wiring::build_pipeline_deps(&layout, watch_state, batch_size).await?;
    let coordinator = PipelineCoordinator::new(deps);
    let outcome = coordinator.run_batch(&candidates, force, None, PipelineStage::Annotate).await?;

    if output_stats {
        println!(
            "{}",
            serde_json::json!({
                "filesProcessed": outcome.files_processed,
                "filesSkipped": outcome.files_skipped,
                "errors": outcome.errors,
                "durationMs": outcome.duration_ms,
            })
        );
    }
    Ok(())
}
