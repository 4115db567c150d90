//! End-to-end exercise of the command surface against a real temp
//! workspace: `init`, then a dry-run `parse`/`annotate` over it.

use astdb::commands::{annotate, init, parse};

#[tokio::test]
async fn init_then_dry_run_parse_sees_the_freshly_created_file() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("lib.rs"), "pub fn hello() {}").await.unwrap();

    init::run(dir.path(), false, false, false).await.unwrap();
    assert!(dir.path().join(".astdb").join("asts").exists());

    parse::run(
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

    // dry-run never writes AST output.
    assert!(dir.path().join(".astdb").join("asts").read_dir().unwrap().next().is_none());
}

#[tokio::test]
async fn init_is_idempotent_without_force() {
    let dir = tempfile::tempdir().unwrap();
    init::run(dir.path(), false, false, false).await.unwrap();
    init::run(dir.path(), false, false, false).await.unwrap();
}

#[tokio::test]
async fn annotate_dry_run_over_an_uninitialized_workspace_still_reports_candidates() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("a.rs"), "fn a() {}").await.unwrap();

    annotate::run(dir.path(), false, false, 10, 4, true, false).await.unwrap();
}
