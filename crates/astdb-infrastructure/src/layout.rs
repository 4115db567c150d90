//! C1 File Store & Layout: the fixed `.astdb/` directory structure, atomic
//! writes, advisory locking and `.gitignore` management.

use std::path::{Path, PathBuf};

use astdb_domain::error::{Error, Result};
use fs2::FileExt;

/// Name of the index directory under a workspace root.
pub const ASTDB_DIR: &str = ".astdb";

const MARKER_BEGIN: &str = "# >>> astdb managed block >>>";
const MARKER_END: &str = "# <<< astdb managed block <<<";

/// Resolved paths for every fixed sub-location under `.astdb/`.
#[derive(Debug, Clone)]
pub struct AstdbLayout {
    root: PathBuf,
}

impl AstdbLayout {
    /// Anchor the layout at `workspace_root/.astdb`.
    #[must_use]
    pub fn new(workspace_root: impl AsRef<Path>) -> Self {
        Self {
            root: workspace_root.as_ref().join(ASTDB_DIR),
        }
    }

    /// The `.astdb/` directory itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parsed-AST output directory.
    #[must_use]
    pub fn asts_dir(&self) -> PathBuf {
        self.root.join("asts")
    }

    /// Per-node annotation output directory.
    #[must_use]
    pub fn annots_dir(&self) -> PathBuf {
        self.root.join("annots")
    }

    /// Vector metadata sidecar log.
    #[must_use]
    pub fn vectors_db(&self) -> PathBuf {
        self.root.join("vectors.db")
    }

    /// HNSW graph snapshot file.
    #[must_use]
    pub fn hnsw_index(&self) -> PathBuf {
        self.root.join("hnsw.index")
    }

    /// Embedding model artifact cache.
    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        self.root.join("models")
    }

    /// Local snapshot archives.
    #[must_use]
    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join("snapshots")
    }

    /// Watch-loop session state.
    #[must_use]
    pub fn watch_state_file(&self) -> PathBuf {
        self.root.join("watch-state.json")
    }

    /// Advisory lock guarding init/snapshot/rebuild.
    #[must_use]
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(".lock")
    }

    /// Create the full directory structure. Idempotent.
    pub async fn ensure(&self) -> Result<()> {
        for dir in [
            self.root.clone(),
            self.asts_dir(),
            self.annots_dir(),
            self.models_dir(),
            self.snapshots_dir(),
        ] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }

    /// Whether `.astdb/` already exists at this root.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }
}

/// Write `bytes` to `path` via a sibling `.tmp` file and atomic rename,
/// removing the tmp file if the write fails partway.
pub async fn atomic_write_file(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let tmp = tmp_path(path);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Holds an advisory exclusive lock on `.astdb/.lock` for the lifetime of
/// the guard. Blocking acquisition runs on a `spawn_blocking` thread since
/// `fs2` offers no async API.
pub struct WorkspaceLock {
    file: std::fs::File,
}

impl WorkspaceLock {
    /// Acquire the lock, creating the lock file if needed. Blocks until
    /// available; callers wanting fail-fast semantics should race this
    /// against a timeout.
    pub async fn acquire(lock_path: impl Into<PathBuf>) -> Result<Self> {
        let lock_path = lock_path.into();
        tokio::task::spawn_blocking(move || {
            if let Some(parent) = lock_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .open(&lock_path)?;
            file.lock_exclusive()
                .map_err(|e| Error::filesystem(format!("failed to acquire workspace lock: {e}")))?;
            Ok(Self { file })
        })
        .await
        .map_err(|e| Error::filesystem(format!("lock acquisition task panicked: {e}")))?
    }

    /// Try to acquire without blocking; `Ok(None)` means another process
    /// holds the lock.
    pub async fn try_acquire(lock_path: impl Into<PathBuf>) -> Result<Option<Self>> {
        let lock_path = lock_path.into();
        tokio::task::spawn_blocking(move || {
            if let Some(parent) = lock_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .open(&lock_path)?;
            match file.try_lock_exclusive() {
                Ok(()) => Ok(Some(Self { file })),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
                Err(e) => Err(Error::filesystem(format!("failed to acquire workspace lock: {e}"))),
            }
        })
        .await
        .map_err(|e| Error::filesystem(format!("lock acquisition task panicked: {e}")))?
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// One line of a marker block already matches `.astdb` per the spec's
/// matching rule: case-sensitive, allowing a leading `/`, a leading `**/`,
/// a trailing `/`, or a trailing inline comment.
fn line_matches_astdb(line: &str) -> bool {
    let trimmed = line.trim();
    let without_comment = trimmed.split('#').next().unwrap_or("").trim();
    if without_comment.is_empty() {
        return false;
    }
    let stripped = without_comment
        .strip_prefix("**/")
        .or_else(|| without_comment.strip_prefix('/'))
        .unwrap_or(without_comment);
    let stripped = stripped.strip_suffix('/').unwrap_or(stripped);
    stripped == ASTDB_DIR
}

fn managed_block() -> String {
    format!(
        "{MARKER_BEGIN}\n{ASTDB_DIR}/\n{ASTDB_DIR}/asts/\n{ASTDB_DIR}/annots/\n{ASTDB_DIR}/models/\n{ASTDB_DIR}/snapshots/\n{MARKER_END}\n"
    )
}

/// Append the astdb marker block to `gitignore_path` unless an existing
/// line already matches `.astdb`; create the file if absent. Returns
/// whether the file was modified.
pub async fn ensure_gitignore_entry(gitignore_path: impl AsRef<Path>) -> Result<bool> {
    let gitignore_path = gitignore_path.as_ref();

    let existing = match tokio::fs::read_to_string(gitignore_path).await {
        Ok(contents) => Some(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    if let Some(contents) = &existing {
        if contents.lines().any(line_matches_astdb) {
            return Ok(false);
        }
    }

    let mut new_contents = existing.unwrap_or_default();
    if !new_contents.is_empty() && !new_contents.ends_with('\n') {
        new_contents.push('\n');
    }
    if !new_contents.is_empty() {
        new_contents.push('\n');
    }
    new_contents.push_str(&managed_block());

    atomic_write_file(gitignore_path, new_contents.as_bytes()).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_creates_every_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let layout = AstdbLayout::new(dir.path());
        layout.ensure().await.unwrap();

        assert!(layout.asts_dir().is_dir());
        assert!(layout.annots_dir().is_dir());
        assert!(layout.models_dir().is_dir());
        assert!(layout.snapshots_dir().is_dir());
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_tmp_file_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        atomic_write_file(&path, b"{}").await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"{}");
        assert!(!tmp_path(&path).exists());
    }

    #[tokio::test]
    async fn gitignore_created_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".gitignore");
        let modified = ensure_gitignore_entry(&path).await.unwrap();

        assert!(modified);
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.contains(".astdb/"));
    }

    #[tokio::test]
    async fn gitignore_untouched_when_already_matched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".gitignore");
        tokio::fs::write(&path, "node_modules/\n.astdb\n").await.unwrap();

        let modified = ensure_gitignore_entry(&path).await.unwrap();
        assert!(!modified);

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "node_modules/\n.astdb\n");
    }

    #[test]
    fn line_matching_covers_the_spec_variants() {
        assert!(line_matches_astdb(".astdb/"));
        assert!(line_matches_astdb(".astdb"));
        assert!(line_matches_astdb("/.astdb/"));
        assert!(line_matches_astdb("**/.astdb/"));
        assert!(line_matches_astdb(".astdb/ # index cache"));
        assert!(!line_matches_astdb(".astdbfoo/"));
        assert!(!line_matches_astdb("src/.astdb-backup/"));
    }

    #[tokio::test]
    async fn workspace_lock_blocks_a_second_holder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".lock");

        let first = WorkspaceLock::acquire(&path).await.unwrap();
        let second = WorkspaceLock::try_acquire(&path).await.unwrap();
        assert!(second.is_none());

        drop(first);
        let third = WorkspaceLock::try_acquire(&path).await.unwrap();
        assert!(third.is_some());
    }
}
