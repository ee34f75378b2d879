//! Catalog handle and the actor task that owns the document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reelvault_protocol::{CompressionStatus, TranscodeStatus};
use reelvault_transfer::{base_name, sanitize_display_name};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::document;
use crate::error::CatalogError;
use crate::types::ArtifactRecord;

type Reply<T> = oneshot::Sender<Result<T, CatalogError>>;

enum Command {
    Append {
        record: ArtifactRecord,
        reply: Reply<()>,
    },
    SetCompressionFlag {
        fragment: String,
        value: bool,
        reply: Reply<bool>,
    },
    SetTranscodeStatus {
        filename: String,
        status: TranscodeStatus,
        error: Option<String>,
        reply: Reply<bool>,
    },
    Snapshot {
        reply: Reply<Vec<ArtifactRecord>>,
    },
}

/// Cloneable handle to the catalog actor.
///
/// The actor stops once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct Catalog {
    tx: mpsc::Sender<Command>,
    path: Arc<PathBuf>,
}

impl Catalog {
    /// Opens (creating if needed) the document at `path` and spawns the
    /// actor that serializes access to it.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        if tokio::fs::try_exists(&path).await? {
            // Fail fast on a corrupt document instead of on the first request.
            let records = document::load(&path).await?;
            info!(path = %path.display(), records = records.len(), "catalog opened");
        } else {
            document::save(&path, &[]).await?;
            info!(path = %path.display(), "catalog created");
        }

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(run(path.clone(), rx));

        Ok(Self {
            tx,
            path: Arc::new(path),
        })
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a record at the end of the catalog.
    pub async fn append(&self, record: ArtifactRecord) -> Result<(), CatalogError> {
        self.request(|reply| Command::Append { record, reply }).await
    }

    /// Every record in catalog order.
    pub async fn records(&self) -> Result<Vec<ArtifactRecord>, CatalogError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Every artifact name in catalog order.
    pub async fn list_all(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self
            .records()
            .await?
            .into_iter()
            .map(|r| r.filename)
            .collect())
    }

    /// The record stored under exactly `filename`.
    pub async fn get(&self, filename: &str) -> Result<Option<ArtifactRecord>, CatalogError> {
        let records = self.records().await?;
        Ok(document::position_by_name(&records, filename).map(|idx| records[idx].clone()))
    }

    /// The record matching `fragment`; see [`document::position_by_fragment`].
    pub async fn find_by_name_fragment(
        &self,
        fragment: &str,
    ) -> Result<Option<ArtifactRecord>, CatalogError> {
        let records = self.records().await?;
        Ok(document::position_by_fragment(&records, fragment).map(|idx| records[idx].clone()))
    }

    /// Sets the compression flag of the record matching `fragment`.
    ///
    /// Returns `false` when nothing matched.
    pub async fn set_compression_flag(&self, fragment: &str, value: bool) -> Result<bool, CatalogError> {
        let fragment = fragment.to_string();
        self.request(|reply| Command::SetCompressionFlag {
            fragment,
            value,
            reply,
        })
        .await
    }

    /// Records the transcode outcome for `filename`.
    ///
    /// A success also sets the compression flag. Returns `false` when the
    /// record is not catalogued.
    pub async fn set_transcode_status(
        &self,
        filename: &str,
        status: TranscodeStatus,
        error: Option<String>,
    ) -> Result<bool, CatalogError> {
        let filename = filename.to_string();
        self.request(|reply| Command::SetTranscodeStatus {
            filename,
            status,
            error,
            reply,
        })
        .await
    }

    /// Compression progress for a client-supplied display name.
    ///
    /// The name is sanitized and its extension dropped before matching, so
    /// `"a.mp4"`, `"a"` and `"a_compressed"` all report on `a.mp4`.
    /// Returns `None` when nothing matches.
    pub async fn compression_status(
        &self,
        display_name: &str,
    ) -> Result<Option<CompressionStatus>, CatalogError> {
        let sanitized = sanitize_display_name(display_name);
        let fragment = base_name(&sanitized);

        let records = self.records().await?;
        let Some(idx) = document::position_by_fragment(&records, fragment) else {
            return Ok(None);
        };
        let source = document::resolve_parent(&records, &records[idx]);

        Ok(Some(CompressionStatus {
            compression_complete: source.compression_complete.unwrap_or(false),
            transcode: source.transcode,
            error: source.transcode_error.clone(),
        }))
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, CatalogError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| CatalogError::Closed)?;
        rx.await.map_err(|_| CatalogError::Closed)?
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

async fn run(path: PathBuf, mut rx: mpsc::Receiver<Command>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Append { record, reply } => {
                let filename = record.filename.clone();
                let result = mutate(&path, |records| {
                    records.push(record);
                    true
                })
                .await
                .map(|_| ());
                if result.is_ok() {
                    debug!(artifact = %filename, "catalog record appended");
                }
                let _ = reply.send(result);
            }
            Command::SetCompressionFlag {
                fragment,
                value,
                reply,
            } => {
                let result = mutate(&path, |records| {
                    match document::position_by_fragment(records, &fragment) {
                        Some(idx) => {
                            records[idx].compression_complete = Some(value);
                            true
                        }
                        None => false,
                    }
                })
                .await;
                let _ = reply.send(result);
            }
            Command::SetTranscodeStatus {
                filename,
                status,
                error,
                reply,
            } => {
                let result = mutate(&path, |records| {
                    let Some(idx) = document::position_by_name(records, &filename) else {
                        return false;
                    };
                    let record = &mut records[idx];
                    record.transcode = Some(status);
                    record.transcode_error = error;
                    if status == TranscodeStatus::Succeeded {
                        record.compression_complete = Some(true);
                    }
                    true
                })
                .await;
                if matches!(result, Ok(true)) {
                    debug!(artifact = %filename, ?status, "transcode status recorded");
                }
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(document::load(&path).await);
            }
        }
    }
    debug!(path = %path.display(), "catalog task stopped");
}

/// Re-reads the document, applies `f` and writes it back if `f` changed it.
async fn mutate<F>(path: &Path, f: F) -> Result<bool, CatalogError>
where
    F: FnOnce(&mut Vec<ArtifactRecord>) -> bool,
{
    let mut records = document::load(path).await?;
    if !f(&mut records) {
        return Ok(false);
    }
    document::save(path, &records).await?;
    Ok(true)
}
