//! C9 Snapshot Engine: deterministic pack/verify/restore of a `.astdb/`
//! directory plus remote storage adapters.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use astdb_domain::error::{Error, Result};
use astdb_domain::model::{RepositoryInfo, SnapshotMetadata, SnapshotSize};
use astdb_domain::ports::snapshot_engine::{
    CreateSnapshotOptions, RestoreOutcome, RestoreSnapshotOptions, SnapshotEngine, SnapshotPhase, SnapshotProgress,
};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use crate::layout::atomic_write_file;

const SNAPSHOT_VERSION: &str = "1.0.0";
const METADATA_ENTRY_NAME: &str = "snapshot-metadata.json";

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn report(on_progress: &Option<Box<dyn Fn(SnapshotProgress) + Send + Sync>>, phase: SnapshotPhase, percentage: u8) {
    if let Some(callback) = on_progress {
        callback(SnapshotProgress { phase, percentage });
    }
}

/// A file selected for inclusion, as `(absolute_path, archive_relative_name)`.
fn included(relative: &Path, options: &CreateSnapshotOptions) -> bool {
    let Some(top) = relative.components().next().and_then(|c| c.as_os_str().to_str()) else {
        return true;
    };
    match top {
        "models" => options.include_models,
        "cache" => options.include_cache,
        "logs" => options.include_logs,
        "snapshots" => false,
        _ => true,
    }
}

fn collect_source_files(astdb_path: &Path, options: &CreateSnapshotOptions) -> Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(astdb_path).into_iter() {
        let entry = entry.map_err(|e| Error::filesystem(format!("failed to walk {}: {e}", astdb_path.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(astdb_path)
            .map_err(|e| Error::path(format!("{e}")))?;
        if !included(relative, options) {
            continue;
        }
        files.push((entry.path().to_path_buf(), relative.to_string_lossy().replace('\\', "/")));
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn build_entries_tar(files: &[(PathBuf, String)]) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());
    for (abs_path, relative_name) in files {
        builder
            .append_path_with_name(abs_path, relative_name)
            .map_err(|e| Error::filesystem(format!("failed to add {relative_name} to archive: {e}")))?;
    }
    builder
        .into_inner()
        .map_err(|e| Error::filesystem(format!("failed to finalize archive: {e}")))
}

fn repository_info(file_count: u64) -> RepositoryInfo {
    RepositoryInfo {
        url: None,
        commit_sha: None,
        branch: None,
        file_count,
    }
}

/// [`SnapshotEngine`] backed by tar+gzip archives, grounded on the same
/// scanning/compressing/finalizing phase split used by the pipeline
/// coordinator's own progress reporting.
#[derive(Debug, Default)]
pub struct TarSnapshotEngine;

impl TarSnapshotEngine {
    /// Construct a new engine. Stateless.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SnapshotEngine for TarSnapshotEngine {
    async fn create_snapshot(
        &self,
        options: CreateSnapshotOptions,
        on_progress: Option<Box<dyn Fn(SnapshotProgress) + Send + Sync>>,
    ) -> Result<SnapshotMetadata> {
        report(&on_progress, SnapshotPhase::Scanning, 0);
        let astdb_path = PathBuf::from(&options.astdb_path);
        let files = collect_source_files(&astdb_path, &options)?;
        report(&on_progress, SnapshotPhase::Scanning, 20);

        let entries_tar = build_entries_tar(&files)?;
        let checksum = sha256_hex(&entries_tar);
        report(&on_progress, SnapshotPhase::Compressing, 50);

        let metadata = SnapshotMetadata {
            version: options.version.clone().unwrap_or_else(|| SNAPSHOT_VERSION.to_string()),
            created_at: now_ms(),
            description: options.description.clone(),
            tags: options.tags.clone(),
            size: SnapshotSize {
                uncompressed: entries_tar.len() as u64,
                compressed: 0,
            },
            checksum,
            repository: repository_info(files.len() as u64),
        };

        let compressed = pack_final_archive(&metadata, &entries_tar, options.compression_level)?;
        report(&on_progress, SnapshotPhase::Compressing, 80);

        let mut metadata = metadata;
        metadata.size.compressed = compressed.len() as u64;

        atomic_write_file(&options.output_path, &compressed).await?;
        report(&on_progress, SnapshotPhase::Finalizing, 100);

        Ok(metadata)
    }

    async fn restore_snapshot(
        &self,
        options: RestoreSnapshotOptions,
        on_progress: Option<Box<dyn Fn(SnapshotProgress) + Send + Sync>>,
    ) -> Result<RestoreOutcome> {
        let started = std::time::Instant::now();
        report(&on_progress, SnapshotPhase::Scanning, 0);

        let archive_bytes = tokio::fs::read(&options.snapshot_path).await?;
        let (metadata, entries_tar) = unpack_archive(&archive_bytes)?;
        report(&on_progress, SnapshotPhase::Scanning, 30);

        if options.validate_checksum {
            let actual = sha256_hex(&entries_tar);
            if actual != metadata.checksum {
                return Err(Error::validation(format!(
                    "snapshot checksum mismatch: expected {}, got {actual}",
                    metadata.checksum
                ))
                .with_context("snapshot_path", options.snapshot_path.clone()));
            }
        }
        report(&on_progress, SnapshotPhase::Compressing, 50);

        let target_path = PathBuf::from(&options.target_path);
        let backup_path = prepare_target(&target_path, options.create_backup, options.overwrite)?;

        let files_restored = extract_entries(&entries_tar, &target_path, options.skip_models)?;
        report(&on_progress, SnapshotPhase::Finalizing, 100);

        Ok(RestoreOutcome {
            target_path: options.target_path,
            files_restored,
            backup_path,
            duration_ms: started.elapsed().as_millis() as u64,
            metadata,
        })
    }
}

fn pack_final_archive(metadata: &SnapshotMetadata, entries_tar: &[u8], compression_level: u8) -> Result<Vec<u8>> {
    let meta_json = serde_json::to_vec_pretty(metadata)?;

    let encoder = GzEncoder::new(Vec::new(), Compression::new(compression_level.min(9) as u32));
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_gnu();
    header.set_size(meta_json.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(metadata.created_at / 1000);
    header.set_cksum();
    builder
        .append_data(&mut header, METADATA_ENTRY_NAME, &meta_json[..])
        .map_err(|e| Error::filesystem(format!("failed to write snapshot metadata entry: {e}")))?;

    let mut source = tar::Archive::new(entries_tar);
    for entry in source
        .entries()
        .map_err(|e| Error::filesystem(format!("failed to re-read archive entries: {e}")))?
    {
        let mut entry = entry.map_err(|e| Error::filesystem(format!("corrupt archive entry: {e}")))?;
        let header = entry.header().clone();
        builder
            .append(&header, &mut entry)
            .map_err(|e| Error::filesystem(format!("failed to copy archive entry: {e}")))?;
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| Error::filesystem(format!("failed to finalize archive: {e}")))?;
    encoder
        .finish()
        .map_err(|e| Error::filesystem(format!("failed to finish gzip stream: {e}")))
}

/// Decompress `archive_bytes`, returning the embedded metadata plus the
/// re-serialized tar bytes of every non-metadata entry (used both for
/// checksum validation and extraction).
fn unpack_archive(archive_bytes: &[u8]) -> Result<(SnapshotMetadata, Vec<u8>)> {
    let decoder = GzDecoder::new(archive_bytes);
    let mut archive = tar::Archive::new(decoder);

    let mut metadata: Option<SnapshotMetadata> = None;
    let mut rebuilt = tar::Builder::new(Vec::new());

    for entry in archive
        .entries()
        .map_err(|e| Error::filesystem(format!("failed to open snapshot archive: {e}")))?
    {
        let mut entry = entry.map_err(|e| Error::filesystem(format!("corrupt snapshot entry: {e}")))?;
        let path = entry
            .path()
            .map_err(|e| Error::filesystem(format!("invalid entry path: {e}")))?
            .to_string_lossy()
            .into_owned();

        if path == METADATA_ENTRY_NAME {
            let mut contents = Vec::new();
            entry
                .read_to_end(&mut contents)
                .map_err(|e| Error::filesystem(format!("failed to read snapshot metadata: {e}")))?;
            metadata = Some(serde_json::from_slice(&contents)?);
            continue;
        }

        let header = entry.header().clone();
        rebuilt
            .append(&header, &mut entry)
            .map_err(|e| Error::filesystem(format!("failed to rebuild archive entry: {e}")))?;
    }

    let metadata = metadata.ok_or_else(|| Error::validation("snapshot archive is missing its metadata entry"))?;
    let rebuilt = rebuilt
        .into_inner()
        .map_err(|e| Error::filesystem(format!("failed to finalize rebuilt archive: {e}")))?;

    Ok((metadata, rebuilt))
}

fn prepare_target(target_path: &Path, create_backup: bool, overwrite: bool) -> Result<Option<String>> {
    if !target_path.exists() {
        return Ok(None);
    }

    if create_backup {
        let backup_path = target_path.with_extension(format!("bak.{}", now_ms()));
        std::fs::rename(target_path, &backup_path)
            .map_err(|e| Error::filesystem(format!("failed to back up {}: {e}", target_path.display())))?;
        return Ok(Some(backup_path.to_string_lossy().into_owned()));
    }

    if !overwrite {
        return Err(Error::validation(format!(
            "target path {} already exists; pass overwrite or create_backup",
            target_path.display()
        )));
    }

    std::fs::remove_dir_all(target_path)
        .map_err(|e| Error::filesystem(format!("failed to clear {}: {e}", target_path.display())))?;
    Ok(None)
}

fn extract_entries(entries_tar: &[u8], target_path: &Path, skip_models: bool) -> Result<u64> {
    std::fs::create_dir_all(target_path)
        .map_err(|e| Error::filesystem(format!("failed to create {}: {e}", target_path.display())))?;

    let mut archive = tar::Archive::new(entries_tar);
    let mut count = 0u64;
    for entry in archive
        .entries()
        .map_err(|e| Error::filesystem(format!("failed to read archive for extraction: {e}")))?
    {
        let mut entry = entry.map_err(|e| Error::filesystem(format!("corrupt archive entry: {e}")))?;
        let relative = entry
            .path()
            .map_err(|e| Error::filesystem(format!("invalid entry path: {e}")))?
            .to_path_buf();

        if skip_models && relative.starts_with("models") {
            continue;
        }

        let dest = target_path.join(&relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry
            .unpack(&dest)
            .map_err(|e| Error::filesystem(format!("failed to extract {}: {e}", relative.display())))?;
        count += 1;
    }
    Ok(count)
}

/// [`RemoteSnapshotStorage`](astdb_domain::ports::snapshot_engine::RemoteSnapshotStorage)
/// backed by a simple HTTP object-storage API.
pub struct HttpRemoteSnapshotStorage {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteSnapshotStorage {
    /// Point the adapter at `base_url`, e.g. `https://snapshots.example.com/v1`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(serde::Deserialize)]
struct PublishResponse {
    id: String,
    url: String,
    metadata: SnapshotMetadata,
}

#[derive(serde::Deserialize)]
struct ListEntry {
    id: String,
    url: String,
    metadata: SnapshotMetadata,
}

#[async_trait]
impl astdb_domain::ports::snapshot_engine::RemoteSnapshotStorage for HttpRemoteSnapshotStorage {
    async fn publish(&self, local_path: &str) -> Result<(String, String, SnapshotMetadata)> {
        let bytes = tokio::fs::read(local_path).await?;
        let response = self
            .client
            .post(format!("{}/snapshots", self.base_url))
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::filesystem(format!("snapshot publish request failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::filesystem(format!("snapshot publish rejected: {e}")))?
            .json::<PublishResponse>()
            .await
            .map_err(|e| Error::filesystem(format!("snapshot publish response invalid: {e}")))?;
        Ok((response.id, response.url, response.metadata))
    }

    async fn download(&self, id: &str, local_path: &str) -> Result<String> {
        let bytes = self
            .client
            .get(format!("{}/snapshots/{id}", self.base_url))
            .send()
            .await
            .map_err(|e| Error::filesystem(format!("snapshot download request failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::filesystem(format!("snapshot {id} not found: {e}")))?
            .bytes()
            .await
            .map_err(|e| Error::filesystem(format!("snapshot download body invalid: {e}")))?;
        atomic_write_file(local_path, &bytes).await?;
        Ok(local_path.to_string())
    }

    async fn list(&self) -> Result<Vec<(String, String, SnapshotMetadata)>> {
        let entries = self
            .client
            .get(format!("{}/snapshots", self.base_url))
            .send()
            .await
            .map_err(|e| Error::filesystem(format!("snapshot list request failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::filesystem(format!("snapshot list rejected: {e}")))?
            .json::<Vec<ListEntry>>()
            .await
            .map_err(|e| Error::filesystem(format!("snapshot list response invalid: {e}")))?;
        Ok(entries.into_iter().map(|e| (e.id, e.url, e.metadata)).collect())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete(format!("{}/snapshots/{id}", self.base_url))
            .send()
            .await
            .map_err(|e| Error::filesystem(format!("snapshot delete request failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::filesystem(format!("snapshot {id} delete rejected: {e}")))?;
        Ok(())
    }
}

/// Sorts for merged local+remote snapshot listings (spec §4.C9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSortKey {
    /// By `SnapshotMetadata::created_at`.
    CreatedAt,
    /// By `SnapshotMetadata::version`.
    Version,
    /// By `SnapshotMetadata::size.compressed`.
    Size,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest/earliest first.
    Ascending,
    /// Largest/latest first.
    Descending,
}

/// Sort and optionally tag-filter a merged listing of `(id, url, metadata)`
/// triples.
pub fn sort_and_filter_snapshots(
    mut entries: Vec<(String, String, SnapshotMetadata)>,
    key: SnapshotSortKey,
    direction: SortDirection,
    tag_filter: Option<&str>,
) -> Vec<(String, String, SnapshotMetadata)> {
    if let Some(tag) = tag_filter {
        entries.retain(|(_, _, metadata)| metadata.tags.iter().any(|t| t == tag));
    }

    entries.sort_by(|a, b| match key {
        SnapshotSortKey::CreatedAt => a.2.created_at.cmp(&b.2.created_at),
        SnapshotSortKey::Version => a.2.version.cmp(&b.2.version),
        SnapshotSortKey::Size => a.2.size.compressed.cmp(&b.2.size.compressed),
    });

    if direction == SortDirection::Descending {
        entries.reverse();
    }
    entries
}
