//! One module per subcommand; [`dispatch`] is the single place that maps
//! a parsed [`crate::Command`] onto its handler.

pub mod annotate;
pub mod embed;
pub mod init;
pub mod parse;
pub mod query;
pub mod rebuild_index;
pub mod serve;
pub mod snapshot;
pub mod watch;

use astdb_domain::error::Result;

use crate::cli::{Cli, Command, SnapshotAction};

pub async fn dispatch(cli: Cli) -> Result<()> {
    let workspace = cli.workspace.as_path();

    match cli.command {
        Command::Init { force, dry_run, no_gitignore } => init::run(workspace, force, dry_run, no_gitignore).await,
        Command::Parse {
            changed,
            staged,
            glob,
            base,
            force,
            batch_size,
            dry_run,
            output_stats,
        } => parse::run(workspace, changed, staged, glob, base, force, batch_size, dry_run, output_stats).await,
        Command::Annotate {
            changed,
            force,
            batch_size,
            max_concurrency,
            dry_run,
            output_stats,
        } => annotate::run(workspace, changed, force, batch_size, max_concurrency, dry_run, output_stats).await,
        Command::Embed { files } => embed::run(workspace, files).await,
        Command::Query { text, top } => query::run(workspace, text, top).await,
        Command::Watch { globs } => watch::run(workspace, globs).await,
        Command::RebuildIndex { output_dir } => rebuild_index::run(workspace, output_dir).await,
        Command::Snapshot { action } => dispatch_snapshot(workspace, action).await,
        Command::Serve => serve::run(workspace, cli.config).await,
    }
}

async fn dispatch_snapshot(workspace: &std::path::Path, action: SnapshotAction) -> Result<()> {
    match action {
        SnapshotAction::Create {
            output,
            description,
            tag,
            compression_level,
            include_models,
        } => snapshot::create(workspace, output, description, tag, compression_level, include_models).await,
        SnapshotAction::Restore {
            snapshot_path,
            no_backup,
            skip_checksum,
            skip_models,
            overwrite,
        } => snapshot::restore(workspace, snapshot_path, no_backup, skip_checksum, skip_models, overwrite).await,
        SnapshotAction::List { remote, tag } => snapshot::list(workspace, remote, tag).await,
        SnapshotAction::Publish { path, remote } => snapshot::publish(path, remote).await,
        SnapshotAction::Download { id, remote, output } => snapshot::download(id, remote, output).await,
        SnapshotAction::Delete { id, remote } => snapshot::delete(id, remote).await,
    }
}
