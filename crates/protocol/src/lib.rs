//! Wire types for the ReelVault upload, merge, and streaming API.
//!
//! The JSON shapes here are consumed by the browser upload widget, so
//! field names are camelCase and optional fields are omitted when empty.

pub mod constants;
pub mod messages;
pub mod types;

pub use messages::{
    ChunkQuery, CompressionStatus, CompressionStatusQuery, ErrorBody, MergeRequest,
    MergeResponse, StatusMessage,
};
pub use types::{TranscodeStatus, UploadConfig};
