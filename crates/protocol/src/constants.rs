/// Default ceiling on the total bytes accepted for one upload (5 GiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Default chunk size advertised to clients (1 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// How many times the widget retries a failed chunk.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay between chunk retries, in milliseconds.
pub const DEFAULT_CHUNK_RETRY_INTERVAL_MS: u64 = 2000;

/// Progress callback throttle (seconds) advertised to the widget.
pub const THROTTLE_PROGRESS_CALLBACKS: u32 = 1;

/// File types accepted by the widget. `*` means anything.
pub const ACCEPT_ANY_FILE_TYPE: &str = "*";

/// Lowercase extensions (without the dot) treated as video.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// Suffix appended to a video's base name for its derived files.
pub const COMPRESSED_SUFFIX: &str = "_compressed";

/// Extension of the still-frame thumbnail derived from a video.
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// Extension of the compressed rendition derived from a video.
pub const RENDITION_EXTENSION: &str = "mp4";

/// Returns `true` if `ext` (without the dot, any case) is a video extension.
pub fn is_video_extension(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str())
}
