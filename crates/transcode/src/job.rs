use std::path::{Path, PathBuf};

use reelvault_protocol::constants::{
    COMPRESSED_SUFFIX, RENDITION_EXTENSION, THUMBNAIL_EXTENSION, is_video_extension,
};
use uuid::Uuid;

/// Returns `true` if the path's extension marks it as a video.
pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_video_extension)
}

/// Output files derived from one source video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivatives {
    pub thumbnail: PathBuf,
    pub rendition: PathBuf,
}

/// Derived file paths for `source`, placed in the same directory.
///
/// `dir/clip.mov` yields `dir/clip_compressed.jpg` and
/// `dir/clip_compressed.mp4`.
pub fn derivatives_for(source: &Path) -> Option<Derivatives> {
    let stem = source.file_stem()?.to_str()?;
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    Some(Derivatives {
        thumbnail: dir.join(format!("{stem}{COMPRESSED_SUFFIX}.{THUMBNAIL_EXTENSION}")),
        rendition: dir.join(format!("{stem}{COMPRESSED_SUFFIX}.{RENDITION_EXTENSION}")),
    })
}

/// One queued transcode of a catalogued video.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub id: Uuid,
    pub source: PathBuf,
    /// Catalog name of the source artifact.
    pub artifact: String,
}

impl TranscodeJob {
    pub fn new(source: impl Into<PathBuf>, artifact: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            artifact: artifact.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_detection() {
        assert!(is_video(Path::new("merged/a.mp4")));
        assert!(is_video(Path::new("merged/A.MKV")));
        assert!(is_video(Path::new("b.avi")));
        assert!(is_video(Path::new("c.mov")));
        assert!(!is_video(Path::new("My_Report1.pdf")));
        assert!(!is_video(Path::new("mp4")));
        assert!(!is_video(Path::new("archive.mp4.zip")));
    }

    #[test]
    fn derivative_names() {
        let d = derivatives_for(Path::new("merged/clip.mov")).unwrap();
        assert_eq!(d.thumbnail, Path::new("merged/clip_compressed.jpg"));
        assert_eq!(d.rendition, Path::new("merged/clip_compressed.mp4"));
    }

    #[test]
    fn derivative_names_keep_inner_dots() {
        let d = derivatives_for(Path::new("v1.2.mp4")).unwrap();
        assert_eq!(d.rendition, Path::new("v1.2_compressed.mp4"));
    }

    #[test]
    fn jobs_get_distinct_ids() {
        let a = TranscodeJob::new("a.mp4", "a.mp4");
        let b = TranscodeJob::new("a.mp4", "a.mp4");
        assert_ne!(a.id, b.id);
    }
}
