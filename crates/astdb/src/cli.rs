//! Clap argument definitions, mirroring the CLI surface table exactly:
//! one variant per subcommand, flags named after the spec's own names.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// AST-aware semantic code index: parse, annotate, embed and query a
/// workspace's source tree.
#[derive(Debug, Parser)]
#[command(name = "astdb", version, about)]
pub struct Cli {
    /// Workspace root; defaults to the current directory.
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Explicit query-server config file, overriding the default search
    /// order (`--config` > `mcp-server.config.json` > `.astdb/config.json`
    /// > `.astdb/mcp-server.config.json` > `config/mcp-server.json`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create `.astdb/` structure, update `.gitignore` unless suppressed.
    Init {
        /// Recreate `.astdb/` even if it already exists.
        #[arg(long)]
        force: bool,
        /// Report what would happen without writing anything.
        #[arg(long)]
        dry_run: bool,
        /// Skip updating `.gitignore`.
        #[arg(long)]
        no_gitignore: bool,
    },

    /// Select files and run stage 1 (C4 parsing).
    Parse {
        /// Select files with uncommitted changes relative to `--base`.
        #[arg(long, conflicts_with = "staged")]
        changed: bool,
        /// Select files staged in the VCS index.
        #[arg(long, conflicts_with = "changed")]
        staged: bool,
        /// Select files matching a glob pattern.
        #[arg(long, value_name = "PAT")]
        glob: Option<String>,
        /// Base ref `--changed` diffs against.
        #[arg(long, default_value = "HEAD")]
        base: String,
        /// Process every selected file regardless of watch-state history.
        #[arg(long)]
        force: bool,
        /// Files per pipeline batch.
        #[arg(long, default_value_t = 50)]
        batch_size: usize,
        /// Parse but suppress writes to `asts/`.
        #[arg(long)]
        dry_run: bool,
        /// Print per-batch statistics as JSON on completion.
        #[arg(long)]
        output_stats: bool,
    },

    /// Stage 2 (C5 annotation) over files already parsed.
    Annotate {
        /// Select files with uncommitted changes relative to `HEAD`.
        #[arg(long)]
        changed: bool,
        /// Process every selected file regardless of watch-state history.
        #[arg(long)]
        force: bool,
        /// Files per pipeline batch.
        #[arg(long, default_value_t = 50)]
        batch_size: usize,
        /// Max files annotated concurrently within a batch.
        #[arg(long, default_value_t = 4)]
        max_concurrency: usize,
        /// Annotate but suppress writes to `annots/`.
        #[arg(long)]
        dry_run: bool,
        /// Print per-batch statistics as JSON on completion.
        #[arg(long)]
        output_stats: bool,
    },

    /// Stage 3 (C6 embedding + C7 indexing) over an explicit file list.
    Embed {
        /// Files to embed; each must already have parsed/annotated
        /// output under `.astdb/`.
        files: Vec<String>,
    },

    /// Run a similarity search and print the top-K matches as JSON.
    Query {
        /// Free-text query, embedded server-side.
        text: String,
        /// Number of results to return.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Long-running select -> parse -> annotate -> embed loop with
    /// debounce, driven by filesystem change notifications.
    Watch {
        /// Glob patterns to watch; persisted alongside watch state so a
        /// later bare `watch` reuses them.
        globs: Vec<String>,
    },

    /// Rebuild the HNSW index from the metadata sidecar.
    RebuildIndex {
        /// Write the rebuilt index under this directory instead of
        /// `.astdb/`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Pack, restore, and manage `.astdb/` snapshots (local and remote).
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Start the query server (C10) on the configured transport.
    Serve,
}

/// `snapshot` subcommands.
#[derive(Debug, Subcommand)]
pub enum SnapshotAction {
    /// Pack `.astdb/` into a checksummed, compressed local archive.
    Create {
        /// Destination archive path.
        #[arg(long)]
        output: PathBuf,
        /// Free-text description embedded in the snapshot metadata.
        #[arg(long)]
        description: Option<String>,
        /// Tags embedded in the snapshot metadata.
        #[arg(long)]
        tag: Vec<String>,
        /// gzip compression level, `0..=9`.
        #[arg(long, default_value_t = 6)]
        compression_level: u8,
        /// Include `models/` in the archive.
        #[arg(long)]
        include_models: bool,
    },

    /// Verify and extract a local archive.
    Restore {
        /// Source archive path.
        snapshot_path: PathBuf,
        /// Skip backing up an existing `.astdb/` before extracting.
        #[arg(long)]
        no_backup: bool,
        /// Skip verifying the archive's checksum before extracting.
        #[arg(long)]
        skip_checksum: bool,
        /// Skip restoring `models/`.
        #[arg(long)]
        skip_models: bool,
        /// Overwrite an existing `.astdb/` when not backing it up.
        #[arg(long)]
        overwrite: bool,
    },

    /// List local snapshot archives.
    List {
        /// List a remote store's snapshots instead of the local
        /// `.astdb/snapshots/` directory.
        #[arg(long)]
        remote: Option<String>,
        /// Only list snapshots carrying this tag (remote listings only).
        #[arg(long)]
        tag: Option<String>,
    },

    /// Upload a local archive to a remote store.
    Publish {
        /// Local archive path to upload.
        path: PathBuf,
        /// Base URL of the remote snapshot store.
        #[arg(long)]
        remote: String,
    },

    /// Download a remote snapshot to a local path.
    Download {
        /// Remote snapshot id.
        id: String,
        /// Base URL of the remote snapshot store.
        #[arg(long)]
        remote: String,
        /// Local destination path.
        #[arg(long)]
        output: PathBuf,
    },

    /// Delete a remote snapshot.
    Delete {
        /// Remote snapshot id.
        id: String,
        /// Base URL of the remote snapshot store.
        #[arg(long)]
        remote: String,
    },
}
