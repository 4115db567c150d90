//! C8 Watch State Manager: `watch-state.json` persistence for the
//! long-running watch loop.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use astdb_domain::error::Result;
use astdb_domain::model::{FileState, FileStatus, StagesCompleted};
use astdb_domain::ports::watch_state::{ChangedPaths, WatchStateManager, WatchStatistics};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::layout::atomic_write_file;

/// Autosave cadence: a dirty state is flushed no more than this often.
const AUTOSAVE_INTERVAL_MS: u64 = 5_000;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Select/debounce configuration persisted alongside watch state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Glob patterns the watch loop selects files with.
    pub glob: Vec<String>,
    /// Debounce window, in milliseconds.
    pub debounce_ms: u64,
    /// Files processed per pipeline batch.
    pub batch_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            glob: Vec::new(),
            debounce_ms: 300,
            batch_size: 50,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedStatistics {
    total_changes: u64,
    files_processed: u64,
    errors: u64,
    files_skipped: u64,
    total_processing_time_ms: u64,
    avg_processing_time_ms: f64,
}

impl From<PersistedStatistics> for WatchStatistics {
    fn from(s: PersistedStatistics) -> Self {
        Self {
            total_changes: s.total_changes,
            files_processed: s.files_processed,
            errors: s.errors,
            files_skipped: s.files_skipped,
            total_processing_time_ms: s.total_processing_time_ms,
            avg_processing_time_ms: s.avg_processing_time_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedState {
    session_id: String,
    session_start: u64,
    last_run: String,
    files: BTreeMap<String, FileState>,
    statistics: PersistedStatistics,
    config: WatchConfig,
}

impl PersistedState {
    fn fresh(config: WatchConfig) -> Self {
        let started = now_ms();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: started,
            last_run: chrono::Utc::now().to_rfc3339(),
            files: BTreeMap::new(),
            statistics: PersistedStatistics::default(),
            config,
        }
    }
}

/// True if the top-level shape required by spec §4.C8 is present:
/// `lastRun` a string, `files` an object, `statistics` an object.
fn has_required_shape(value: &serde_json::Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    matches!(object.get("last_run"), Some(serde_json::Value::String(_)))
        && matches!(object.get("files"), Some(serde_json::Value::Object(_)))
        && matches!(object.get("statistics"), Some(serde_json::Value::Object(_)))
}

async fn load_or_default(path: &Path, default_config: WatchConfig) -> (PersistedState, Option<String>) {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(_) => return (PersistedState::fresh(default_config), None),
    };

    let value: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            return (
                PersistedState::fresh(default_config),
                Some(format!("watch-state.json is not valid JSON ({e}); starting a fresh session")),
            );
        }
    };

    if !has_required_shape(&value) {
        return (
            PersistedState::fresh(default_config),
            Some("watch-state.json is missing required fields; starting a fresh session".to_string()),
        );
    }

    match serde_json::from_value::<PersistedState>(value) {
        Ok(state) => (state, None),
        Err(e) => (
            PersistedState::fresh(default_config),
            Some(format!("watch-state.json failed to parse ({e}); starting a fresh session")),
        ),
    }
}

/// [`WatchStateManager`] backed by a JSON file, autosaved when dirty.
pub struct JsonWatchStateManager {
    path: PathBuf,
    state: RwLock<PersistedState>,
    dirty: AtomicBool,
    last_saved_ms: AtomicU64,
    /// Non-fatal warning surfaced if the persisted file failed validation
    /// on load.
    pub load_warning: Option<String>,
}

impl JsonWatchStateManager {
    /// Load `watch-state.json` at `path`, falling back to a fresh session
    /// (with `default_config`) if it is absent or fails validation.
    pub async fn open(path: impl Into<PathBuf>, default_config: WatchConfig) -> Result<Self> {
        let path = path.into();
        let (state, load_warning) = load_or_default(&path, default_config).await;
        if let Some(warning) = &load_warning {
            tracing::warn!(path = %path.display(), "{warning}");
        }
        Ok(Self {
            path,
            state: RwLock::new(state),
            dirty: AtomicBool::new(false),
            last_saved_ms: AtomicU64::new(0),
            load_warning,
        })
    }

    /// The select/debounce configuration currently persisted alongside
    /// watch state, e.g. for a bare `watch` invocation to reuse the last
    /// session's glob set.
    pub async fn config(&self) -> WatchConfig {
        self.state.read().await.config.clone()
    }

    fn sha256_hex(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hex::encode(hasher.finalize())
    }

    async fn maybe_autosave(&self) -> Result<()> {
        if !self.dirty.load(Ordering::SeqCst) {
            return Ok(());
        }
        let elapsed = now_ms().saturating_sub(self.last_saved_ms.load(Ordering::SeqCst));
        if elapsed >= AUTOSAVE_INTERVAL_MS {
            self.save().await?;
        }
        Ok(())
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl WatchStateManager for JsonWatchStateManager {
    async fn has_file_changed(&self, path: &str) -> Result<bool> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(_) => return Ok(true),
        };
        let hash = Self::sha256_hex(&content);
        let state = self.state.read().await;
        Ok(state.files.get(path).is_none_or(|f| f.has_changed(&hash)))
    }

    async fn get_files_to_process(&self, paths: &[String]) -> Result<ChangedPaths> {
        let mut result = ChangedPaths::default();
        let mut newly_skipped = 0u64;

        for path in paths {
            if self.has_file_changed(path).await? {
                result.changed.push(path.clone());
            } else {
                result.unchanged.push(path.clone());
                newly_skipped += 1;
            }
        }

        if newly_skipped > 0 {
            let mut state = self.state.write().await;
            state.statistics.files_skipped += newly_skipped;
            drop(state);
            self.mark_dirty();
            self.maybe_autosave().await?;
        }

        Ok(result)
    }

    async fn record_success(&self, path: &str, stages: StagesCompleted, duration_ms: u64) -> Result<()> {
        let content = tokio::fs::read(path).await.unwrap_or_default();
        let hash = Self::sha256_hex(&content);
        let now = now_ms();

        let mut state = self.state.write().await;
        let entry = state
            .files
            .entry(path.to_string())
            .or_insert_with(|| FileState::new_pending(path, now, hash.clone()));
        entry.content_hash = hash;
        entry.last_modified = now;
        entry.last_processed = Some(now);
        entry.status = FileStatus::Success;
        entry.error = None;
        entry.stages_completed.parsed |= stages.parsed;
        entry.stages_completed.annotated |= stages.annotated;
        entry.stages_completed.embedded |= stages.embedded;

        let stats = &mut state.statistics;
        stats.total_changes += 1;
        stats.files_processed += 1;
        stats.total_processing_time_ms += duration_ms;
        stats.avg_processing_time_ms = stats.total_processing_time_ms as f64 / stats.files_processed as f64;
        drop(state);

        self.mark_dirty();
        self.maybe_autosave().await
    }

    async fn record_error(&self, path: &str, message: &str) -> Result<()> {
        let now = now_ms();
        let mut state = self.state.write().await;
        let entry = state
            .files
            .entry(path.to_string())
            .or_insert_with(|| FileState::new_pending(path, now, String::new()));
        entry.last_processed = Some(now);
        entry.status = FileStatus::Error;
        entry.error = Some(message.to_string());

        state.statistics.total_changes += 1;
        state.statistics.errors += 1;
        drop(state);

        self.mark_dirty();
        self.maybe_autosave().await
    }

    async fn cleanup(&self, active_paths: &[String]) -> Result<usize> {
        let active: std::collections::HashSet<&str> = active_paths.iter().map(String::as_str).collect();
        let mut state = self.state.write().await;
        let before = state.files.len();
        state.files.retain(|path, _| active.contains(path.as_str()));
        let removed = before - state.files.len();
        drop(state);

        if removed > 0 {
            self.mark_dirty();
            self.maybe_autosave().await?;
        }
        Ok(removed)
    }

    async fn get_file_state(&self, path: &str) -> Result<Option<FileState>> {
        Ok(self.state.read().await.files.get(path).cloned())
    }

    async fn statistics(&self) -> Result<WatchStatistics> {
        Ok(self.state.read().await.statistics.clone().into())
    }

    async fn save(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.last_run = chrono::Utc::now().to_rfc3339();
        let bytes = serde_json::to_vec_pretty(&*state)?;
        drop(state);

        atomic_write_file(&self.path, &bytes).await?;
        self.last_saved_ms.store(now_ms(), Ordering::SeqCst);
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }
}
