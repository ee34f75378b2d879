use serde::{Deserialize, Serialize};

use crate::types::TranscodeStatus;

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Query for the chunk probe (`GET /upload`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkQuery {
    pub resumable_identifier: String,
    pub resumable_chunk_number: u32,
}

/// Asks the server to assemble every chunk of an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// Display name as picked by the user; sanitized server-side.
    pub filename: String,
    /// Upload identifier the chunks were sent under.
    pub identifier: String,
    pub total_chunks: u32,
}

/// Query for `GET /compression-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionStatusQuery {
    pub filename: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Plain acknowledgement with a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    pub message: String,
    /// Server-side path of the assembled artifact.
    pub file_path: String,
}

/// Compression progress for a catalogued artifact.
///
/// `compressionComplete` is the field the widget polls; `transcode` and
/// `error` additionally expose a failed transcode instead of leaving the
/// flag false forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionStatus {
    pub compression_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcode: Option<TranscodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error body returned with every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    /// Underlying cause, when there is one worth showing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// First missing chunk index of a failed merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_chunk: Option<u32>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
            missing_chunk: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
