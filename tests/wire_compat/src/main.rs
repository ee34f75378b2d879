fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use reelvault_catalog::ArtifactRecord;
    use reelvault_protocol::{
        ChunkQuery, CompressionStatus, ErrorBody, MergeRequest, MergeResponse, StatusMessage,
        TranscodeStatus, UploadConfig,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (key order does not matter).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  widget: {fixture}\n  server: {reserialized}"
        );
    }

    // --- Request payloads ---

    #[test]
    fn fixture_chunk_query() {
        roundtrip_test::<ChunkQuery>("chunk_query.json");
    }

    #[test]
    fn fixture_merge_request() {
        roundtrip_test::<MergeRequest>("merge_request.json");
    }

    // --- Response payloads ---

    #[test]
    fn fixture_upload_config() {
        roundtrip_test::<UploadConfig>("upload_config.json");
    }

    #[test]
    fn fixture_status_message() {
        roundtrip_test::<StatusMessage>("status_message.json");
    }

    #[test]
    fn fixture_merge_response() {
        roundtrip_test::<MergeResponse>("merge_response.json");
    }

    #[test]
    fn fixture_compression_status_plain() {
        roundtrip_test::<CompressionStatus>("compression_status_plain.json");
    }

    #[test]
    fn fixture_compression_status_pending() {
        roundtrip_test::<CompressionStatus>("compression_status_pending.json");
    }

    #[test]
    fn fixture_compression_status_failed() {
        roundtrip_test::<CompressionStatus>("compression_status_failed.json");
    }

    #[test]
    fn fixture_error_missing_chunk() {
        roundtrip_test::<ErrorBody>("error_missing_chunk.json");
        let body: ErrorBody = serde_json::from_value(load_fixture("error_missing_chunk.json")).unwrap();
        assert_eq!(body.missing_chunk, Some(2));
    }

    #[test]
    fn fixture_error_internal() {
        roundtrip_test::<ErrorBody>("error_internal.json");
    }

    // --- Catalog document ---

    #[test]
    fn fixture_file_list() {
        let fixture = load_fixture("file_list.json");
        let records: Vec<ArtifactRecord> = serde_json::from_value(fixture.clone()).unwrap();
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].filename, "My_Report1.pdf");
        assert!(records[0].compression_complete.is_none());
        assert_eq!(records[1].compression_complete, Some(true));
        assert_eq!(records[1].transcode, Some(TranscodeStatus::Succeeded));
        assert!(records[2].is_derivative());
        assert_eq!(records[2].parent.as_deref(), Some("a.mp4"));
        assert_eq!(records[3].transcode, Some(TranscodeStatus::Failed));
        assert!(records[3].transcode_error.is_some());

        // Optional fields stay omitted when written back.
        let reserialized = serde_json::to_value(&records).unwrap();
        for (orig, back) in fixture
            .as_array()
            .unwrap()
            .iter()
            .zip(reserialized.as_array().unwrap())
        {
            let mut orig_keys: Vec<_> = orig.as_object().unwrap().keys().collect();
            let mut back_keys: Vec<_> = back.as_object().unwrap().keys().collect();
            orig_keys.sort();
            back_keys.sort();
            assert_eq!(orig_keys, back_keys);
        }
    }

    // --- Documents written before transcode tracking existed ---

    #[test]
    fn legacy_video_record_without_transcode() {
        let json = r#"{
            "filename": "old.mp4",
            "uploadDate": "2023-11-20T09:15:00.000Z",
            "compressionComplete": false
        }"#;
        let rec: ArtifactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.compression_complete, Some(false));
        assert!(rec.transcode.is_none(), "missing transcode should default to None");
        assert!(rec.parent.is_none());
    }

    #[test]
    fn legacy_compression_status_without_transcode() {
        let json = r#"{"compressionComplete": true}"#;
        let status: CompressionStatus = serde_json::from_str(json).unwrap();
        assert!(status.compression_complete);
        assert!(status.transcode.is_none());
        assert!(status.error.is_none());
    }
}
