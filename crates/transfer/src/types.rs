use std::fmt;
use std::path::PathBuf;

/// Storage identity of one chunk: upload identifier plus 1-based index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub upload_id: String,
    pub index: u32,
}

impl ChunkKey {
    pub fn new(upload_id: impl Into<String>, index: u32) -> Self {
        Self {
            upload_id: upload_id.into(),
            index,
        }
    }

    /// File name of the chunk inside its upload directory.
    pub fn file_name(&self) -> String {
        chunk_file_name(self.index)
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.upload_id, self.index)
    }
}

pub(crate) const CHUNK_EXTENSION: &str = "chunk";

pub(crate) fn chunk_file_name(index: u32) -> String {
    format!("{index}.{CHUNK_EXTENSION}")
}

/// Parses `<index>.chunk` back into the index. Temp files do not parse.
pub(crate) fn parse_chunk_file_name(name: &str) -> Option<u32> {
    let index = name.strip_suffix(CHUNK_EXTENSION)?.strip_suffix('.')?;
    index.parse().ok().filter(|i| *i > 0)
}

/// Phase of a single merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    /// Chunks are still arriving; no merge requested yet.
    Collecting,
    /// Checking that every index is present.
    Verifying,
    /// Copying chunk `next` into the partial artifact.
    Writing { next: u32 },
    /// Artifact renamed into place.
    Finalized,
    /// Aborted on the first absent index.
    Failed { missing: u32 },
}

impl fmt::Display for MergeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeState::Collecting => f.write_str("collecting"),
            MergeState::Verifying => f.write_str("verifying"),
            MergeState::Writing { next } => write!(f, "writing({next})"),
            MergeState::Finalized => f.write_str("finalized"),
            MergeState::Failed { missing } => write!(f, "failed({missing})"),
        }
    }
}

/// A finished artifact produced by a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledArtifact {
    /// Sanitized name; also the file name inside the merged directory.
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub chunks: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_file_names_roundtrip() {
        let key = ChunkKey::new("up", 12);
        assert_eq!(key.file_name(), "12.chunk");
        assert_eq!(parse_chunk_file_name(&key.file_name()), Some(12));
    }

    #[test]
    fn temp_and_zero_names_do_not_parse() {
        assert_eq!(parse_chunk_file_name("3.chunk.abc.tmp"), None);
        assert_eq!(parse_chunk_file_name("0.chunk"), None);
        assert_eq!(parse_chunk_file_name("x.chunk"), None);
    }

    #[test]
    fn keys_differ_by_upload() {
        assert_ne!(ChunkKey::new("a", 1), ChunkKey::new("b", 1));
        assert_eq!(ChunkKey::new("a", 1).to_string(), "a#1");
    }

    #[test]
    fn merge_state_display() {
        assert_eq!(MergeState::Collecting.to_string(), "collecting");
        assert_eq!(MergeState::Verifying.to_string(), "verifying");
        assert_eq!(MergeState::Writing { next: 2 }.to_string(), "writing(2)");
        assert_eq!(MergeState::Finalized.to_string(), "finalized");
        assert_eq!(MergeState::Failed { missing: 3 }.to_string(), "failed(3)");
    }
}
