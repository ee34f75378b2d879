//! Removal of abandoned uploads and interrupted merge output.

use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::store::ChunkStore;
use crate::{PARTIAL_DIR, TransferError};

/// Outcome of one [`sweep`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub uploads_removed: usize,
    pub partials_removed: usize,
}

/// Deletes upload directories and partial merge files that have not been
/// modified for at least `max_age`.
///
/// Only the partial subdirectory of `merged_dir` is swept; finished
/// artifacts are never touched. Missing directories are treated as empty.
pub async fn sweep(
    store: &ChunkStore,
    merged_dir: &Path,
    max_age: Duration,
) -> Result<SweepReport, TransferError> {
    let now = SystemTime::now();
    let mut report = SweepReport::default();

    if let Some(mut entries) = read_dir_opt(store.root()).await? {
        while let Some(entry) = entries.next_entry().await? {
            let meta = match entry.metadata().await {
                Ok(m) => m,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !meta.is_dir() || !is_stale(&meta, now, max_age) {
                continue;
            }
            let upload_id = entry.file_name().to_string_lossy().into_owned();
            match store.remove_upload(&upload_id).await {
                Ok(()) => {
                    tracing::info!(upload_id = %upload_id, "removed stale upload");
                    report.uploads_removed += 1;
                }
                Err(e) => tracing::warn!(upload_id = %upload_id, error = %e, "failed to remove stale upload"),
            }
        }
    }

    if let Some(mut entries) = read_dir_opt(&merged_dir.join(PARTIAL_DIR)).await? {
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let meta = match entry.metadata().await {
                Ok(m) => m,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !meta.is_file() || !is_stale(&meta, now, max_age) {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    tracing::info!(file = %name, "removed stale partial merge");
                    report.partials_removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(file = %name, error = %e, "failed to remove partial merge"),
            }
        }
    }

    Ok(report)
}

fn is_stale(meta: &std::fs::Metadata, now: SystemTime, max_age: Duration) -> bool {
    let Ok(modified) = meta.modified() else {
        return false;
    };
    now.duration_since(modified).unwrap_or(Duration::ZERO) >= max_age
}

async fn read_dir_opt(dir: &Path) -> Result<Option<tokio::fs::ReadDir>, TransferError> {
    match tokio::fs::read_dir(dir).await {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::ArtifactAssembler;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);
    const STALE_PARTIAL: &str = "0f3c9a.partial";

    async fn setup(dir: &TempDir) -> (ChunkStore, std::path::PathBuf) {
        let store = ChunkStore::new(dir.path().join("uploads"), 1 << 20);
        let merged = dir.path().join("merged");
        tokio::fs::create_dir_all(merged.join(PARTIAL_DIR)).await.unwrap();

        store.put("abandoned", 1, b"x").await.unwrap();
        tokio::fs::write(merged.join(PARTIAL_DIR).join(STALE_PARTIAL), b"half")
            .await
            .unwrap();
        tokio::fs::write(merged.join("clip.mp4"), b"done").await.unwrap();
        (store, merged)
    }

    #[tokio::test]
    async fn fresh_files_survive() {
        let dir = TempDir::new().unwrap();
        let (store, merged) = setup(&dir).await;

        let report = sweep(&store, &merged, HOUR).await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert!(store.exists("abandoned", 1).await);
        assert!(merged.join(PARTIAL_DIR).join(STALE_PARTIAL).exists());
    }

    #[tokio::test]
    async fn stale_uploads_and_partials_removed() {
        let dir = TempDir::new().unwrap();
        let (store, merged) = setup(&dir).await;

        let report = sweep(&store, &merged, Duration::ZERO).await.unwrap();
        assert_eq!(report.uploads_removed, 1);
        assert_eq!(report.partials_removed, 1);
        assert!(!store.exists("abandoned", 1).await);
        assert!(!merged.join(PARTIAL_DIR).join(STALE_PARTIAL).exists());
        // Finished artifacts are never touched.
        assert!(merged.join("clip.mp4").exists());
        assert!(merged.join(PARTIAL_DIR).is_dir());
    }

    #[tokio::test]
    async fn artifacts_named_like_partials_survive() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path().join("uploads"), 1 << 20);
        let asm = ArtifactAssembler::new(store.clone(), dir.path().join("merged"));

        store.put("u1", 1, b"notes").await.unwrap();
        let artifact = asm.assemble(".notes.partial", "u1", 1).await.unwrap();

        let report = sweep(&store, asm.merged_dir(), Duration::ZERO).await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert_eq!(tokio::fs::read(&artifact.path).await.unwrap(), b"notes");
    }

    #[tokio::test]
    async fn missing_directories_are_empty() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path().join("nope"), 1);
        let report = sweep(&store, &dir.path().join("also-nope"), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report, SweepReport::default());
    }
}
