use std::sync::Arc;

use reelvault_catalog::Catalog;
use reelvault_protocol::UploadConfig;
use reelvault_transcode::TranscodeQueue;
use reelvault_transfer::{ArtifactAssembler, ChunkStore};

use crate::merge::MergePipeline;

/// Shared state handed to every request handler.
#[derive(Debug)]
pub struct AppState {
    pub store: ChunkStore,
    pub assembler: ArtifactAssembler,
    pub catalog: Catalog,
    pub pipeline: MergePipeline,
    /// Served verbatim by `GET /config`.
    pub upload_config: UploadConfig,
}

impl AppState {
    pub fn new(
        assembler: ArtifactAssembler,
        catalog: Catalog,
        queue: TranscodeQueue,
        upload_config: UploadConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store: assembler.store().clone(),
            pipeline: MergePipeline::new(assembler.clone(), catalog.clone(), queue),
            assembler,
            catalog,
            upload_config,
        })
    }
}
