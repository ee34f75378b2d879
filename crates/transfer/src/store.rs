use std::fmt::Display;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures_util::{Stream, StreamExt, pin_mut};
use tokio::io::AsyncWriteExt;

use crate::TransferError;
use crate::types::{chunk_file_name, parse_chunk_file_name};
use crate::validation::validate_upload_id;

// ---------------------------------------------------------------------------
// ChunkStore
// ---------------------------------------------------------------------------

/// Persists upload chunks as `<root>/<upload_id>/<index>.chunk`.
///
/// Every (upload identifier, index) pair maps to exactly one file, so a
/// re-sent chunk overwrites the previous copy instead of duplicating it.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    root: PathBuf,
    max_upload_size: u64,
}

impl ChunkStore {
    /// Creates a store rooted at `root` that accepts at most
    /// `max_upload_size` bytes per upload identifier.
    pub fn new(root: impl Into<PathBuf>, max_upload_size: u64) -> Self {
        Self {
            root: root.into(),
            max_upload_size,
        }
    }

    /// Creates the chunk root if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), TransferError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Returns the chunk root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the per-upload size ceiling in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Directory holding every chunk of `upload_id`.
    pub fn upload_dir(&self, upload_id: &str) -> Result<PathBuf, TransferError> {
        validate_upload_id(upload_id)?;
        Ok(self.root.join(upload_id))
    }

    /// Path of a single chunk. Indices are 1-based.
    pub fn chunk_path(&self, upload_id: &str, index: u32) -> Result<PathBuf, TransferError> {
        if index == 0 {
            return Err(TransferError::InvalidChunkIndex(index));
        }
        Ok(self.upload_dir(upload_id)?.join(chunk_file_name(index)))
    }

    /// Returns `true` if the chunk has been fully received.
    ///
    /// Invalid identifiers or indices simply do not exist.
    pub async fn exists(&self, upload_id: &str, index: u32) -> bool {
        let Ok(path) = self.chunk_path(upload_id, index) else {
            return false;
        };
        tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Stores a chunk held in memory.
    pub async fn put(&self, upload_id: &str, index: u32, data: &[u8]) -> Result<u64, TransferError> {
        let stream = futures_util::stream::once(async move { Ok::<_, std::convert::Infallible>(data) });
        self.put_stream(upload_id, index, None, stream).await
    }

    /// Streams a chunk to disk and returns the number of bytes stored.
    ///
    /// The bytes land in a temporary sibling first and are renamed into
    /// place, so [`exists`](Self::exists) never sees a partial chunk.
    ///
    /// Fails with [`TransferError::SizeExceeded`] when `declared_total`
    /// exceeds the ceiling, or when the bytes already stored for this
    /// upload (other indices) plus this chunk would.
    pub async fn put_stream<S, B, E>(
        &self,
        upload_id: &str,
        index: u32,
        declared_total: Option<u64>,
        stream: S,
    ) -> Result<u64, TransferError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        let path = self.chunk_path(upload_id, index)?;
        let limit = self.max_upload_size;

        if let Some(total) = declared_total {
            if total > limit {
                return Err(TransferError::SizeExceeded {
                    limit,
                    attempted: total,
                });
            }
        }

        let already = self.stored_bytes(upload_id, Some(index)).await?;

        let dir = self.upload_dir(upload_id)?;
        tokio::fs::create_dir_all(&dir).await?;
        let tmp = dir.join(format!(
            "{}.{}.tmp",
            chunk_file_name(index),
            uuid::Uuid::new_v4().simple()
        ));

        let written = match write_stream(&tmp, stream, already, limit).await {
            Ok(n) => n,
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(upload_id, index, bytes = written, "chunk stored");
        Ok(written)
    }

    /// Total bytes stored for `upload_id`, optionally ignoring one index.
    pub async fn stored_bytes(
        &self,
        upload_id: &str,
        excluding: Option<u32>,
    ) -> Result<u64, TransferError> {
        let dir = self.upload_dir(upload_id)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0u64;
        while let Some(entry) = entries.next_entry().await? {
            let Some(index) = parse_chunk_file_name(&entry.file_name().to_string_lossy()) else {
                continue;
            };
            if Some(index) == excluding {
                continue;
            }
            match entry.metadata().await {
                Ok(meta) => total += meta.len(),
                // Consumed by a concurrent merge between listing and stat.
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }

    /// Indices currently stored for `upload_id`, ascending.
    pub async fn list_indices(&self, upload_id: &str) -> Result<Vec<u32>, TransferError> {
        let dir = self.upload_dir(upload_id)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut indices = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(index) = parse_chunk_file_name(&entry.file_name().to_string_lossy()) {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    /// Opens a chunk for reading.
    pub async fn open(&self, upload_id: &str, index: u32) -> Result<tokio::fs::File, TransferError> {
        let path = self.chunk_path(upload_id, index)?;
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(TransferError::MissingChunk { index }),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes one chunk. Deleting an absent chunk is not an error.
    pub async fn remove(&self, upload_id: &str, index: u32) -> Result<(), TransferError> {
        let path = self.chunk_path(upload_id, index)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes every chunk of an upload.
    pub async fn remove_upload(&self, upload_id: &str) -> Result<(), TransferError> {
        let dir = self.upload_dir(upload_id)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the upload directory once a merge has drained it.
    pub(crate) async fn remove_empty_upload_dir(&self, upload_id: &str) {
        if let Ok(dir) = self.upload_dir(upload_id) {
            // Fails harmlessly if a late chunk arrived in the meantime.
            let _ = tokio::fs::remove_dir(&dir).await;
        }
    }
}

async fn write_stream<S, B, E>(
    path: &Path,
    stream: S,
    already: u64,
    limit: u64,
) -> Result<u64, TransferError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    pin_mut!(stream);

    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(item) = stream.next().await {
        let item = item.map_err(|e| TransferError::Stream(e.to_string()))?;
        let bytes = item.as_ref();
        written += bytes.len() as u64;

        let attempted = already + written;
        if attempted > limit {
            return Err(TransferError::SizeExceeded { limit, attempted });
        }
        file.write_all(bytes).await?;
    }

    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir, limit: u64) -> ChunkStore {
        ChunkStore::new(dir.path().join("uploads"), limit)
    }

    async fn leftover_files(store: &ChunkStore, upload_id: &str) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(store.upload_dir(upload_id).unwrap())
            .await
            .unwrap();
        while let Some(e) = entries.next_entry().await.unwrap() {
            names.push(e.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        names
    }

    #[tokio::test]
    async fn put_then_exists() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 1024);

        assert!(!store.exists("up1", 1).await);
        let n = store.put("up1", 1, b"hello").await.unwrap();
        assert_eq!(n, 5);
        assert!(store.exists("up1", 1).await);
        assert!(!store.exists("up1", 2).await);
        assert!(!store.exists("up2", 1).await);
    }

    #[tokio::test]
    async fn invalid_keys_never_exist() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 1024);

        assert!(!store.exists("../up", 1).await);
        assert!(!store.exists("up", 0).await);
        assert!(matches!(
            store.put("up", 0, b"x").await,
            Err(TransferError::InvalidChunkIndex(0))
        ));
        assert!(matches!(
            store.put("a/b", 1, b"x").await,
            Err(TransferError::InvalidIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn reupload_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 1024);

        store.put("up", 1, b"first version").await.unwrap();
        store.put("up", 1, b"second").await.unwrap();

        assert_eq!(store.list_indices("up").await.unwrap(), vec![1]);
        assert_eq!(store.stored_bytes("up", None).await.unwrap(), 6);
        let bytes = tokio::fs::read(store.chunk_path("up", 1).unwrap()).await.unwrap();
        assert_eq!(bytes, b"second");
        assert_eq!(leftover_files(&store, "up").await, vec!["1.chunk"]);
    }

    #[tokio::test]
    async fn ceiling_counts_other_chunks() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 10);

        store.put("up", 1, b"123456").await.unwrap();
        let err = store.put("up", 2, b"123456").await.unwrap_err();
        match err {
            TransferError::SizeExceeded { limit, attempted } => {
                assert_eq!(limit, 10);
                assert_eq!(attempted, 12);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!store.exists("up", 2).await);
        assert_eq!(leftover_files(&store, "up").await, vec!["1.chunk"]);

        // Overwriting index 1 does not count its previous copy.
        store.put("up", 1, b"123456789").await.unwrap();
    }

    #[tokio::test]
    async fn ceiling_is_per_upload() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 8);

        store.put("a", 1, b"12345678").await.unwrap();
        store.put("b", 1, b"12345678").await.unwrap();
    }

    #[tokio::test]
    async fn declared_total_over_ceiling_rejected_upfront() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 100);

        let stream = futures_util::stream::iter(vec![Ok::<_, String>(b"ab".to_vec())]);
        let err = store.put_stream("up", 1, Some(101), stream).await.unwrap_err();
        assert!(matches!(err, TransferError::SizeExceeded { attempted: 101, .. }));
        assert!(!store.exists("up", 1).await);
    }

    #[tokio::test]
    async fn multi_part_stream_is_concatenated() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 100);

        let parts = vec![
            Ok::<_, String>(b"ab".to_vec()),
            Ok(b"cd".to_vec()),
            Ok(b"e".to_vec()),
        ];
        let n = store
            .put_stream("up", 3, Some(5), futures_util::stream::iter(parts))
            .await
            .unwrap();
        assert_eq!(n, 5);
        let bytes = tokio::fs::read(store.chunk_path("up", 3).unwrap()).await.unwrap();
        assert_eq!(bytes, b"abcde");
    }

    #[tokio::test]
    async fn interrupted_stream_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 100);

        let parts = vec![Ok(b"ab".to_vec()), Err("connection reset".to_string())];
        let err = store
            .put_stream("up", 1, None, futures_util::stream::iter(parts))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Stream(ref m) if m == "connection reset"));
        assert!(!store.exists("up", 1).await);
        assert!(leftover_files(&store, "up").await.is_empty());
    }

    #[tokio::test]
    async fn list_indices_sorted() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 1024);

        for i in [3, 1, 10, 2] {
            store.put("up", i, b"x").await.unwrap();
        }
        assert_eq!(store.list_indices("up").await.unwrap(), vec![1, 2, 3, 10]);
        assert!(store.list_indices("never").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_missing_reports_index() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 1024);

        assert!(matches!(
            store.open("up", 4).await,
            Err(TransferError::MissingChunk { index: 4 })
        ));
    }

    #[tokio::test]
    async fn remove_and_remove_upload() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 1024);

        store.put("up", 1, b"a").await.unwrap();
        store.put("up", 2, b"b").await.unwrap();

        store.remove("up", 1).await.unwrap();
        store.remove("up", 1).await.unwrap();
        assert!(!store.exists("up", 1).await);
        assert!(store.exists("up", 2).await);

        store.remove_upload("up").await.unwrap();
        assert!(!store.exists("up", 2).await);
        store.remove_upload("up").await.unwrap();
    }
}
