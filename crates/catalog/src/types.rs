use chrono::{DateTime, Utc};
use reelvault_protocol::TranscodeStatus;
use serde::{Deserialize, Serialize};

/// One finished artifact as stored in the catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    /// Sanitized file name inside the merged directory.
    pub filename: String,
    pub upload_date: DateTime<Utc>,
    /// Set for video artifacts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcode: Option<TranscodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcode_error: Option<String>,
    /// Source artifact of a derived rendition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl ArtifactRecord {
    /// A plain artifact with no compression tracking.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            upload_date: Utc::now(),
            compression_complete: None,
            transcode: None,
            transcode_error: None,
            parent: None,
        }
    }

    /// A video artifact queued for transcoding.
    pub fn video(filename: impl Into<String>) -> Self {
        Self {
            compression_complete: Some(false),
            transcode: Some(TranscodeStatus::Pending),
            ..Self::new(filename)
        }
    }

    /// A rendition derived from `parent`.
    pub fn derivative(filename: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            ..Self::new(filename)
        }
    }

    pub fn is_derivative(&self) -> bool {
        self.parent.is_some()
    }
}
