//! HTTP surface for ReelVault.
//!
//! Routes chunk uploads into the [`ChunkStore`](reelvault_transfer::ChunkStore),
//! runs merges through [`MergePipeline`], answers compression-status polls
//! from the catalog and streams finished artifacts with byte-range support.

mod error;
mod handlers;
mod media;
mod merge;
mod range;
mod server;
mod state;

pub use error::ApiError;
pub use media::content_type_for;
pub use merge::MergePipeline;
pub use range::{ByteRange, RangeError, parse_range};
pub use server::{router, serve};
pub use state::AppState;

/// Errors produced by the server crate.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transfer(#[from] reelvault_transfer::TransferError),

    #[error(transparent)]
    Catalog(#[from] reelvault_catalog::CatalogError),

    #[error(transparent)]
    Transcode(#[from] reelvault_transcode::TranscodeError),
}
