use reelvault_catalog::{ArtifactRecord, Catalog};
use reelvault_protocol::TranscodeStatus;
use reelvault_transcode::{TranscodeQueue, is_video};
use reelvault_transfer::{ArtifactAssembler, AssembledArtifact};
use tracing::{error, info};

use crate::ServerError;

/// Assembly, catalog recording and transcode hand-off for one merge.
#[derive(Debug, Clone)]
pub struct MergePipeline {
    assembler: ArtifactAssembler,
    catalog: Catalog,
    queue: TranscodeQueue,
}

impl MergePipeline {
    pub fn new(assembler: ArtifactAssembler, catalog: Catalog, queue: TranscodeQueue) -> Self {
        Self {
            assembler,
            catalog,
            queue,
        }
    }

    /// Merges the upload and records the artifact.
    ///
    /// Video artifacts are catalogued as pending and queued for
    /// transcoding; the call returns without waiting for the encoder. A
    /// failed assembly records nothing.
    pub async fn merge(
        &self,
        display_name: &str,
        upload_id: &str,
        total_chunks: u32,
    ) -> Result<AssembledArtifact, ServerError> {
        let artifact = self
            .assembler
            .assemble(display_name, upload_id, total_chunks)
            .await?;

        let video = is_video(&artifact.path);
        let record = if video {
            ArtifactRecord::video(artifact.name.clone())
        } else {
            ArtifactRecord::new(artifact.name.clone())
        };
        self.catalog.append(record).await?;
        info!(artifact = %artifact.name, bytes = artifact.size, video, "artifact recorded");

        if video {
            if let Err(e) = self.queue.maybe_transcode(&artifact.path, &artifact.name) {
                error!(artifact = %artifact.name, error = %e, "could not queue transcode");
                self.catalog
                    .set_transcode_status(&artifact.name, TranscodeStatus::Failed, Some(e.to_string()))
                    .await?;
            }
        }

        Ok(artifact)
    }
}
