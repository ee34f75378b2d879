//! Video transcoding pipeline.
//!
//! Merged video artifacts are queued as [`TranscodeJob`]s. A bounded pool
//! of workers runs the [`Encoder`] for each job, producing a thumbnail and
//! a compressed rendition next to the source, and records the outcome in
//! the catalog as `pending`, `succeeded` or `failed`.

pub mod encoder;
pub mod job;
pub mod worker;

pub use encoder::{EncodeFuture, Encoder, FfmpegEncoder};
pub use job::{Derivatives, TranscodeJob, derivatives_for, is_video};
pub use worker::{TranscodeQueue, TranscodeWorker};

/// Errors produced by the transcode pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start encoder {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("encoder exited with {status}: {stderr}")]
    EncoderExit { status: String, stderr: String },

    #[error("no derivative names for {0}")]
    NoDerivatives(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] reelvault_catalog::CatalogError),

    #[error("transcode queue closed")]
    QueueClosed,
}
