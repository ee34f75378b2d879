use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::sanitize::sanitize_display_name;
use crate::store::ChunkStore;
use crate::types::{AssembledArtifact, MergeState};
use crate::validation::validate_artifact_name;
use crate::{PARTIAL_DIR, PARTIAL_EXTENSION, TransferError};

/// Concatenates the chunks of an upload into a named artifact.
///
/// A merge either produces the complete artifact or leaves no artifact
/// behind. Chunks are only consumed once the artifact has
/// been renamed into place.
#[derive(Debug, Clone)]
pub struct ArtifactAssembler {
    store: ChunkStore,
    merged_dir: PathBuf,
}

impl ArtifactAssembler {
    pub fn new(store: ChunkStore, merged_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            merged_dir: merged_dir.into(),
        }
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn merged_dir(&self) -> &Path {
        &self.merged_dir
    }

    /// Directory holding in-progress merge output. Never served.
    pub fn partial_dir(&self) -> PathBuf {
        self.merged_dir.join(PARTIAL_DIR)
    }

    /// Creates the merged directory and its partial subdirectory.
    pub async fn ensure_dir(&self) -> Result<(), TransferError> {
        tokio::fs::create_dir_all(self.partial_dir()).await?;
        Ok(())
    }

    /// Resolves a stored artifact name to its path, rejecting traversal and
    /// the reserved partial directory name.
    pub fn artifact_path(&self, name: &str) -> Result<PathBuf, TransferError> {
        validate_artifact_name(name)?;
        if name == PARTIAL_DIR {
            return Err(TransferError::InvalidName(format!("reserved name: {name}")));
        }
        Ok(self.merged_dir.join(name))
    }

    /// Merges chunks `1..=total_chunks` of `upload_id` into
    /// `<merged_dir>/<sanitized display_name>`.
    ///
    /// Fails with [`TransferError::MissingChunk`] naming the lowest absent
    /// index; in that case no chunk is consumed and a later retry can
    /// succeed once the chunk arrives. An existing artifact of the same
    /// name is replaced.
    pub async fn assemble(
        &self,
        display_name: &str,
        upload_id: &str,
        total_chunks: u32,
    ) -> Result<AssembledArtifact, TransferError> {
        let name = sanitize_display_name(display_name);
        let target = self.artifact_path(&name)?;
        let upload_dir = self.store.upload_dir(upload_id)?;
        if total_chunks == 0 {
            return Err(TransferError::NoChunks);
        }

        tracing::debug!(upload_id, artifact = %name, state = %MergeState::Verifying, "merge");
        for index in 1..=total_chunks {
            if !self.store.exists(upload_id, index).await {
                let state = MergeState::Failed { missing: index };
                tracing::warn!(upload_id, artifact = %name, state = %state, "merge aborted");
                return Err(TransferError::MissingChunk { index });
            }
        }

        // One partial file per merge call.
        self.ensure_dir().await?;
        let partial = self.partial_dir().join(format!(
            "{}.{PARTIAL_EXTENSION}",
            uuid::Uuid::new_v4().simple()
        ));

        let size = match self.write_partial(&partial, upload_id, total_chunks).await {
            Ok(size) => size,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        tracing::debug!(upload_id, artifact = %name, state = %MergeState::Finalized, "merge");

        for index in 1..=total_chunks {
            if let Err(e) = self.store.remove(upload_id, index).await {
                tracing::warn!(upload_id, index, error = %e, "failed to remove merged chunk");
            }
        }
        self.store.remove_empty_upload_dir(upload_id).await;

        tracing::info!(
            upload_id,
            artifact = %name,
            bytes = size,
            chunks = total_chunks,
            dir = %upload_dir.display(),
            "artifact assembled"
        );

        Ok(AssembledArtifact {
            name,
            path: target,
            size,
            chunks: total_chunks,
        })
    }

    async fn write_partial(
        &self,
        partial: &Path,
        upload_id: &str,
        total_chunks: u32,
    ) -> Result<u64, TransferError> {
        let mut out = tokio::fs::File::create(partial).await?;
        let mut size = 0u64;

        for index in 1..=total_chunks {
            let state = MergeState::Writing { next: index };
            tracing::trace!(upload_id, state = %state, "merge");
            // A chunk can vanish between verification and copy (janitor or a
            // concurrent merge); open() reports that as MissingChunk.
            let mut chunk = self.store.open(upload_id, index).await?;
            size += tokio::io::copy(&mut chunk, &mut out).await?;
        }

        out.flush().await?;
        out.sync_all().await?;
        Ok(size)
    }
}
