//! `astdb snapshot {create,restore,list,publish,download,delete}`.

use std::path::{Path, PathBuf};

use astdb_domain::error::Result;
use astdb_domain::ports::snapshot_engine::{CreateSnapshotOptions, RemoteSnapshotStorage, RestoreSnapshotOptions, SnapshotEngine};
use astdb_infrastructure::snapshot::{sort_and_filter_snapshots, HttpRemoteSnapshotStorage, SnapshotSortKey, SortDirection, TarSnapshotEngine};
use astdb_infrastructure::AstdbLayout;

pub async fn create(
    workspace: &Path,
    output: PathBuf,
    description: Option<String>,
    tags: Vec<String>,
    compression_level: u8,
    include_models: bool,
) -> Result<()> {
    let layout = AstdbLayout::new(workspace);
    let engine = TarSnapshotEngine::new();
    let metadata = engine
        .create_snapshot(
            CreateSnapshotOptions {
                astdb_path: layout.root().to_string_lossy().into_owned(),
                output_path: output.to_string_lossy().into_owned(),
                version: None,
                description,
                tags,
                compression_level,
                include_models,
                include_cache: false,
                include_logs: false,
            },
            None,
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn restore(
    workspace: &Path,
    snapshot_path: PathBuf,
    no_backup: bool,
    skip_checksum: bool,
    skip_models: bool,
    overwrite: bool,
) -> Result<()> {
    let layout = AstdbLayout::new(workspace);
    let engine = TarSnapshotEngine::new();
    let outcome = engine
        .restore_snapshot(
            RestoreSnapshotOptions {
                snapshot_path: snapshot_path.to_string_lossy().into_owned(),
                target_path: layout.root().to_string_lossy().into_owned(),
                create_backup: !no_backup,
                validate_checksum: !skip_checksum,
                skip_models,
                overwrite,
            },
            None,
        )
        .await?;

    println!(
        "{}",
        serde_json::json!({
            "targetPath": outcome.target_path,
            "filesRestored": outcome.files_restored,
            "backupPath": outcome.backup_path,
            "durationMs": outcome.duration_ms,
        })
    );
    Ok(())
}

/// Lists snapshots. With `remote` set, this lists a [`HttpRemoteSnapshotStorage`]'s
/// catalog; without it, this enumerates archive files already packed in the
/// workspace's `snapshots/` directory (there is no local snapshot catalog
/// beyond the filesystem itself, so entries carry no description/tags).
pub async fn list(workspace: &Path, remote: Option<String>, tag: Option<String>) -> Result<()> {
    let entries = if let Some(base_url) = remote {
        let storage = HttpRemoteSnapshotStorage::new(base_url);
        storage.list().await?
    } else {
        let layout = AstdbLayout::new(workspace);
        local_snapshot_entries(&layout.snapshots_dir()).await?
    };

    let sorted = sort_and_filter_snapshots(entries, SnapshotSortKey::CreatedAt, SortDirection::Descending, tag.as_deref());
    let rows: Vec<_> = sorted
        .into_iter()
        .map(|(id, url, metadata)| {
            serde_json::json!({
                "id": id,
                "url": url,
                "createdAt": metadata.created_at,
                "tags": metadata.tags,
                "description": metadata.description,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn local_snapshot_entries(dir: &Path) -> Result<Vec<(String, String, astdb_domain::model::SnapshotMetadata)>> {
    use astdb_domain::model::{RepositoryInfo, SnapshotMetadata, SnapshotSize};

    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("tar") && !path.to_string_lossy().ends_with(".tar.gz") {
            continue;
        }
        let meta = entry.metadata().await?;
        let created_at = meta.modified().ok().and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok()).map_or(0, |d| d.as_millis() as u64);
        entries.push((
            path.file_name().unwrap_or_default().to_string_lossy().into_owned(),
            path.to_string_lossy().into_owned(),
            SnapshotMetadata {
                version: "unknown".to_string(),
                created_at,
                description: None,
                tags: Vec::new(),
                size: SnapshotSize {
                    uncompressed: 0,
                    compressed: meta.len(),
                },
                checksum: String::new(),
                repository: RepositoryInfo::default(),
            },
        ));
    }
    Ok(entries)
}

pub async fn publish(path: PathBuf, remote: String) -> Result<()> {
    let storage = HttpRemoteSnapshotStorage::new(remote);
    let (id, url, metadata) = storage.publish(&path.to_string_lossy()).await?;
    println!(
        "{}",
        serde_json::json!({ "id": id, "url": url, "createdAt": metadata.created_at })
    );
    Ok(())
}

pub async fn download(id: String, remote: String, output: PathBuf) -> Result<()> {
    let storage = HttpRemoteSnapshotStorage::new(remote);
    let local_path = storage.download(&id, &output.to_string_lossy()).await?;
    println!("{}", serde_json::json!({ "localPath": local_path }));
    Ok(())
}

pub async fn delete(id: String, remote: String) -> Result<()> {
    let storage = HttpRemoteSnapshotStorage::new(remote);
    storage.delete(&id).await?;
    println!("{}", serde_json::json!({ "deleted": id }));
    Ok(())
}
