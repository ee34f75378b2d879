//! Chunked upload storage and artifact assembly.
//!
//! Chunks are stored per upload identifier and 1-based index, probed for
//! resumption, and concatenated in index order into a finished artifact.

mod assemble;
mod janitor;
mod sanitize;
mod store;
mod types;
mod validation;

pub use assemble::ArtifactAssembler;
pub use janitor::{SweepReport, sweep};
pub use sanitize::{base_name, extension, sanitize_display_name};
pub use store::ChunkStore;
pub use types::{AssembledArtifact, ChunkKey, MergeState};
pub use validation::{validate_artifact_name, validate_upload_id};

/// Subdirectory of the merged directory holding in-progress merge output.
///
/// Reserved: no artifact may use this name.
pub const PARTIAL_DIR: &str = ".partial";

/// Extension of the in-progress files inside [`PARTIAL_DIR`].
pub const PARTIAL_EXTENSION: &str = "partial";

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing chunk {index}")]
    MissingChunk { index: u32 },

    #[error("upload exceeds the {limit} byte limit ({attempted} bytes)")]
    SizeExceeded { limit: u64, attempted: u64 },

    #[error("invalid upload identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("invalid chunk index: {0}")]
    InvalidChunkIndex(u32),

    #[error("merge requires at least one chunk")]
    NoChunks,

    #[error("upload stream interrupted: {0}")]
    Stream(String),
}
