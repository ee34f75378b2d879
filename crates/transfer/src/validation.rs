use std::path::{Component, Path};

use crate::TransferError;

/// Longest identifier or file name accepted as a single path component.
const MAX_COMPONENT_LEN: usize = 255;

/// Validates a client-supplied upload identifier.
///
/// The identifier becomes a directory name under the chunk root, so it must
/// be exactly one normal path component.
pub fn validate_upload_id(upload_id: &str) -> Result<(), TransferError> {
    check_component(upload_id).map_err(TransferError::InvalidIdentifier)
}

/// Validates a sanitized artifact name before it is joined onto the merged
/// directory.
pub fn validate_artifact_name(name: &str) -> Result<(), TransferError> {
    check_component(name).map_err(TransferError::InvalidName)
}

/// Rejects:
/// - Empty or overlong values
/// - NUL bytes and path separators (`/`, `\`)
/// - `.` and `..`
/// - Anything that does not parse as one normal component
fn check_component(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("empty value".into());
    }
    if value.len() > MAX_COMPONENT_LEN {
        return Err(format!("longer than {MAX_COMPONENT_LEN} bytes"));
    }
    if value.contains(['/', '\\', '\0']) {
        return Err(format!("separator or NUL not allowed: {value}"));
    }

    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::ParentDir), _) => Err(format!(
            "parent directory traversal not allowed: {value}"
        )),
        _ => Err(format!("not a single path component: {value}")),
    }
}
