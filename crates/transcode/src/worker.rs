//! Job queue and the worker pool that drains it.

use std::path::Path;
use std::sync::Arc;

use reelvault_catalog::{ArtifactRecord, Catalog};
use reelvault_protocol::TranscodeStatus;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::TranscodeError;
use crate::encoder::Encoder;
use crate::job::{TranscodeJob, derivatives_for, is_video};

/// Sending side of the transcode queue.
#[derive(Debug, Clone)]
pub struct TranscodeQueue {
    tx: mpsc::UnboundedSender<TranscodeJob>,
}

impl TranscodeQueue {
    /// Queues `source` for transcoding if it is a video.
    ///
    /// Returns `Ok(false)` for non-video artifacts. Never waits for the
    /// transcode itself.
    pub fn maybe_transcode(&self, source: &Path, artifact: &str) -> Result<bool, TranscodeError> {
        if !is_video(source) {
            return Ok(false);
        }
        let job = TranscodeJob::new(source, artifact);
        let id = job.id;
        self.tx.send(job).map_err(|_| TranscodeError::QueueClosed)?;
        info!(job = %id, artifact, "transcode queued");
        Ok(true)
    }
}

/// Spawns the dispatcher that runs queued jobs on at most `workers`
/// concurrent encoders.
pub struct TranscodeWorker;

impl TranscodeWorker {
    /// Starts the pool. The dispatcher exits when `cancel` fires or every
    /// [`TranscodeQueue`] has been dropped; encodes already running are
    /// left to finish.
    pub fn spawn(
        catalog: Catalog,
        encoder: Arc<dyn Encoder>,
        workers: usize,
        cancel: CancellationToken,
    ) -> (TranscodeQueue, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(dispatch(rx, catalog, encoder, workers.max(1), cancel));
        (TranscodeQueue { tx }, handle)
    }
}

async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<TranscodeJob>,
    catalog: Catalog,
    encoder: Arc<dyn Encoder>,
    workers: usize,
    cancel: CancellationToken,
) {
    let permits = Arc::new(Semaphore::new(workers));

    loop {
        let job = tokio::select! {
            _ = cancel.cancelled() => break,
            job = rx.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = permits.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let catalog = catalog.clone();
        let encoder = encoder.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let id = job.id;
            let artifact = job.artifact.clone();
            if let Err(e) = run_job(&catalog, encoder.as_ref(), job).await {
                error!(job = %id, artifact = %artifact, error = %e, "failed to record transcode outcome");
            }
        });
    }

    info!("transcode dispatcher stopped");
}

/// Encodes one job and records the outcome.
///
/// Encoder failures are recorded as `failed` and are not returned; only
/// catalog failures are.
async fn run_job(
    catalog: &Catalog,
    encoder: &dyn Encoder,
    job: TranscodeJob,
) -> Result<(), TranscodeError> {
    info!(job = %job.id, artifact = %job.artifact, "transcode started");

    let outcome = match derivatives_for(&job.source) {
        Some(out) => encoder.encode(&job.source, &out).await.map(|()| out),
        None => Err(TranscodeError::NoDerivatives(job.source.display().to_string())),
    };

    match outcome {
        Ok(out) => {
            let rendition = out
                .rendition
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| TranscodeError::NoDerivatives(out.rendition.display().to_string()))?;
            catalog
                .append(ArtifactRecord::derivative(rendition.clone(), job.artifact.clone()))
                .await?;
            if !catalog
                .set_transcode_status(&job.artifact, TranscodeStatus::Succeeded, None)
                .await?
            {
                warn!(artifact = %job.artifact, "transcoded artifact is not catalogued");
            }
            info!(job = %job.id, artifact = %job.artifact, rendition = %rendition, "transcode succeeded");
        }
        Err(e) => {
            error!(job = %job.id, artifact = %job.artifact, error = %e, "transcode failed");
            catalog
                .set_transcode_status(&job.artifact, TranscodeStatus::Failed, Some(e.to_string()))
                .await?;
        }
    }
    Ok(())
}
