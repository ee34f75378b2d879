use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use crate::TranscodeError;
use crate::job::Derivatives;

/// Boxed future returned by [`Encoder::encode`].
pub type EncodeFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TranscodeError>> + Send + 'a>>;

/// Produces the thumbnail and compressed rendition for one video.
///
/// Both outputs belong to a single unit of work: an implementation
/// reports success only when both files exist.
pub trait Encoder: Send + Sync {
    fn encode<'a>(&'a self, source: &'a Path, out: &'a Derivatives) -> EncodeFuture<'a>;
}

// ---------------------------------------------------------------------------
// ffmpeg
// ---------------------------------------------------------------------------

/// Seek offset (seconds) of the thumbnail frame.
const THUMBNAIL_SEEK_SECS: &str = "4";
/// Rendition frame size.
const RENDITION_SIZE: &str = "854x480";
/// Bytes of encoder stderr kept in error messages.
const STDERR_TAIL: usize = 2048;

/// Runs the `ffmpeg` command line tool twice: first for the thumbnail,
/// then, only if that succeeded, for the rendition.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments extracting one frame at the seek offset.
    pub fn thumbnail_args(source: &Path, thumbnail: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), source.into()];
        args.extend(["-ss", THUMBNAIL_SEEK_SECS, "-vframes", "1"].map(OsString::from));
        args.push(thumbnail.into());
        args
    }

    /// Arguments producing the downscaled HEVC/AAC rendition.
    pub fn rendition_args(source: &Path, rendition: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), source.into()];
        args.extend(
            [
                "-s", RENDITION_SIZE, "-vcodec", "libx265", "-crf", "30", "-preset", "slow",
                "-c:a", "aac", "-b:a", "64k", "-map", "0",
            ]
            .map(OsString::from),
        );
        args.push(rendition.into());
        args
    }

    async fn run(&self, args: Vec<OsString>, output: &Path) -> Result<(), TranscodeError> {
        tracing::debug!(program = %self.program.display(), output = %output.display(), "running encoder");

        let result = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| TranscodeError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if result.status.success() {
            return Ok(());
        }

        // Never leave a half-written derivative behind to be served.
        let _ = tokio::fs::remove_file(output).await;

        Err(TranscodeError::EncoderExit {
            status: result.status.to_string(),
            stderr: stderr_tail(&result.stderr),
        })
    }
}

impl Encoder for FfmpegEncoder {
    fn encode<'a>(&'a self, source: &'a Path, out: &'a Derivatives) -> EncodeFuture<'a> {
        Box::pin(async move {
            self.run(Self::thumbnail_args(source, &out.thumbnail), &out.thumbnail)
                .await?;
            let result = self
                .run(Self::rendition_args(source, &out.rendition), &out.rendition)
                .await;
            if result.is_err() {
                // Both derivatives or neither.
                let _ = tokio::fs::remove_file(&out.thumbnail).await;
            }
            result
        })
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
