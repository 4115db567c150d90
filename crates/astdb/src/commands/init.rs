//! `astdb init`: create `.astdb/` and register it in `.gitignore`.

use std::path::Path;

use astdb_domain::error::Result;
use astdb_infrastructure::{ensure_gitignore_entry, AstdbLayout, WorkspaceLock};

pub async fn run(workspace: &Path, force: bool, dry_run: bool, no_gitignore: bool) -> Result<()> {
    let layout = AstdbLayout::new(workspace);

    if layout.exists() && !force {
        println!("{}", serde_json::json!({ "status": "already_initialized", "path": layout.root() }));
        return Ok(());
    }

    if dry_run {
        println!(
            "{}",
            serde_json::json!({
                "status": "dry_run",
                "wouldCreate": layout.root(),
                "wouldUpdateGitignore": !no_gitignore,
            })
        );
        return Ok(());
    }

    let _lock = WorkspaceLock::acquire(layout.lock_file()).await?;
    layout.ensure().await?;

    let gitignore_updated = if no_gitignore {
        false
    } else {
        ensure_gitignore_entry(workspace.join(".gitignore")).await?
    };

    println!(
        "{}",
        serde_json::json!({
            "status": "initialized",
            "path": layout.root(),
            "gitignoreUpdated": gitignore_updated,
        })
    );
    Ok(())
}
