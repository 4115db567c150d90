//! `astdb parse`: select candidates, run stage 1 (C4) over them.

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
    staged: bool,
    glob: Option<String>,
    base: String,
    force: bool,
    batch_size: usize,
    dry_run: bool,
    output_stats: bool,
) -> Result<()> {
    if changed && staged {
        return Err(Error::validation("--changed and --staged are mutually exclusive"));
    }

    let layout = AstdbLayout::new(workspace);
    layout.ensure().await?;

    let query_selection = match (changed, staged, glob) {
        (true, false, _) => QuerySelection::Changed { base },
        (false, true, _) => QuerySelection::Staged,
        (false, false, Some(pattern)) => QuerySelection::Glob(pattern),
        (false, false, None) => QuerySelection::Config,
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
    let outcome = coordinator.run_batch(&candidates, force, None, PipelineStage::Parse).await?;

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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn changed_and_staged_together_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            dir.path(),
            true,
            true,
            None,
            "HEAD".to_string(),
            false,
            10,
            false,
            false,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, astdb_domain::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn dry_run_with_a_glob_reports_candidates_without_writing_output() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.rs"), "fn a() {}").await.unwrap();

        run(
            dir.path(),
            false,
            false,
            Some("*.rs".to_string()),
            "HEAD".to_string(),
            false,
            10,
            true,
            false,
        )
        .await
        .unwrap();

        let layout = AstdbLayout::new(dir.path());
        assert!(!layout.asts_dir().join("a.rs_000000000000.json").exists());
    }
}
