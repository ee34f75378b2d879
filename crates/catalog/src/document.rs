//! Whole-document persistence and pure lookups over catalog records.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reelvault_transfer::base_name;

use crate::error::CatalogError;
use crate::types::ArtifactRecord;

/// Reads the catalog document. A missing or blank file is an empty catalog.
pub async fn load(path: &Path) -> Result<Vec<ArtifactRecord>, CatalogError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Replaces the catalog document with `records`.
///
/// The document is written to a sibling temp file and renamed over the
/// original so readers never observe a truncated catalog.
pub async fn save(path: &Path, records: &[ArtifactRecord]) -> Result<(), CatalogError> {
    let json = serde_json::to_vec_pretty(records)?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &json).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Position of the record matching `fragment`.
///
/// A record whose base name equals the fragment wins; otherwise the first
/// record (in catalog order) whose name contains it. An empty fragment
/// matches nothing.
pub fn position_by_fragment(records: &[ArtifactRecord], fragment: &str) -> Option<usize> {
    if fragment.is_empty() {
        return None;
    }
    records
        .iter()
        .position(|r| base_name(&r.filename) == fragment)
        .or_else(|| records.iter().position(|r| r.filename.contains(fragment)))
}

/// Position of the record stored under exactly `filename`.
pub fn position_by_name(records: &[ArtifactRecord], filename: &str) -> Option<usize> {
    records.iter().position(|r| r.filename == filename)
}

/// Follows a derivative to its source record, if the source is catalogued.
pub fn resolve_parent<'a>(records: &'a [ArtifactRecord], record: &'a ArtifactRecord) -> &'a ArtifactRecord {
    record
        .parent
        .as_deref()
        .and_then(|parent| position_by_name(records, parent))
        .map_or(record, |idx| &records[idx])
}
