//! `astdb watch`: long-running select -> parse -> annotate -> embed loop,
//! driven by filesystem change notifications and the persisted debounce
//! window.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use astdb_application::{PipelineCoordinator, PipelineStage};
use astdb_domain::error::{Error, Result};
use astdb_infrastructure::AstdbLayout;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::{selection, wiring};

pub async fn run(workspace: &Path, globs: Vec<String>) -> Result<()> {
    let layout = AstdbLayout::new(workspace);
    layout.ensure().await?;

    let watch_state = wiring::build_watch_state(&layout, globs, 50).await?;
    let config = watch_state.config().await;
    if config.glob.is_empty() {
        return Err(Error::validation(
            "watch requires at least one glob pattern, either passed on the command line or already persisted from a prior run",
        ));
    }
    let patterns = config.glob;
    let debounce = Duration::from_millis(config.debounce_ms);

    let deps = wiring::build_pipeline_deps(&layout, watch_state, 50).await?;
    let coordinator = PipelineCoordinator::new(deps);

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let runtime_handle = Handle::current();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                let tx = tx.clone();
                runtime_handle.spawn(async move {
                    let _ = tx.send(event);
                });
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| Error::filesystem(format!("failed to start filesystem watcher: {e}")))?;

    watcher
        .watch(workspace, RecursiveMode::Recursive)
        .map_err(|e| Error::filesystem(format!("failed to watch {}: {e}", workspace.display())))?;

    tracing::info!(patterns = ?patterns, "watching for changes");

    while let Some(event) = rx.recv().await {
        let mut changed = BTreeSet::new();
        collect_paths(event, workspace, &mut changed);
        if changed.is_empty() {
            continue;
        }

        tokio::time::sleep(debounce).await;
        while let Ok(event) = rx.try_recv() {
            collect_paths(event, workspace, &mut changed);
        }

        let touched: Vec<String> = selection::glob_match(workspace, &patterns)?
            .into_iter()
            .filter(|candidate| changed.iter().any(|p| Path::new(candidate).ends_with(p)))
            .collect();
        if touched.is_empty() {
            continue;
        }

        match coordinator.run_batch(&touched, false, None, PipelineStage::Embed).await {
            Ok(outcome) => {
                tracing::info!(processed = outcome.files_processed, errors = outcome.errors.len(), "batch complete");
            }
            Err(err) => tracing::error!(%err, "batch failed"),
        }
    }

    Ok(())
}

fn collect_paths(event: Event, workspace: &Path, into: &mut BTreeSet<std::path::PathBuf>) {
    for path in event.paths {
        if let Ok(relative) = path.strip_prefix(workspace) {
            into.insert(relative.to_path_buf());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn watch_without_any_glob_pattern_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(dir.path(), Vec::new()).await.unwrap_err();
        assert_eq!(err.kind, astdb_domain::error::ErrorKind::Validation);
    }
}
