use serde::{Deserialize, Serialize};

/// Client-side upload configuration served to the widget.
///
/// Field names match the options object of the chunked-upload library the
/// widget instantiates, so the response can be passed through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    /// Endpoint that receives chunk POSTs and probe GETs.
    pub target: String,
    pub file_types: Vec<String>,
    pub max_file_size: u64,
    pub chunk_size: u64,
    /// Whether the widget probes each chunk before sending it.
    pub test_chunks: bool,
    pub throttle_progress_callbacks: u32,
    pub max_retries: u32,
    /// Milliseconds between chunk retries.
    pub chunk_retry_interval: u64,
}

/// Outcome of the background transcode for a video artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscodeStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
}

impl TranscodeStatus {
    /// Returns `true` once no further change is expected.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TranscodeStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> UploadConfig {
        UploadConfig {
            target: "http://localhost:3000/upload".into(),
            file_types: vec!["*".into()],
            max_file_size: 1024,
            chunk_size: 256,
            test_chunks: true,
            throttle_progress_callbacks: 1,
            max_retries: 3,
            chunk_retry_interval: 2000,
        }
    }

    #[test]
    fn upload_config_field_names() {
        let json = serde_json::to_value(sample_config()).unwrap();
        assert_eq!(json["target"], "http://localhost:3000/upload");
        assert_eq!(json["fileTypes"][0], "*");
        assert_eq!(json["maxFileSize"], 1024);
        assert_eq!(json["chunkSize"], 256);
        assert_eq!(json["testChunks"], true);
        assert_eq!(json["throttleProgressCallbacks"], 1);
        assert_eq!(json["maxRetries"], 3);
        assert_eq!(json["chunkRetryInterval"], 2000);
    }

    #[test]
    fn transcode_status_serialization() {
        let cases = [
            (TranscodeStatus::Pending, "\"pending\""),
            (TranscodeStatus::Succeeded, "\"succeeded\""),
            (TranscodeStatus::Failed, "\"failed\""),
        ];
        for (status, expected) in cases {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, expected);
            let parsed: TranscodeStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!TranscodeStatus::Pending.is_terminal());
        assert!(TranscodeStatus::Succeeded.is_terminal());
        assert!(TranscodeStatus::Failed.is_terminal());
    }
}
