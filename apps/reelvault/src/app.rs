//! Application orchestrator: wires storage, catalog, transcoding and HTTP.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reelvault_catalog::Catalog;
use reelvault_server::{AppState, serve};
use reelvault_transcode::{FfmpegEncoder, TranscodeWorker};
use reelvault_transfer::{ArtifactAssembler, ChunkStore, SweepReport, sweep};
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Runs the server until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // -- Storage --
    let store = ChunkStore::new(&config.upload_dir, config.max_upload_size);
    store.ensure_root().await?;
    let assembler = ArtifactAssembler::new(store.clone(), &config.merged_dir);
    assembler.ensure_dir().await?;
    let catalog = Catalog::open(&config.catalog_path).await?;

    // -- Transcode --
    let encoder = Arc::new(FfmpegEncoder::new(&config.encoder_program));
    let (queue, transcode_task) = TranscodeWorker::spawn(
        catalog.clone(),
        encoder,
        config.transcode_workers,
        cancel.clone(),
    );
    tracing::info!(
        encoder = %config.encoder_program.display(),
        workers = config.transcode_workers,
        "transcode workers started"
    );

    // -- Janitor --
    let janitor_task = config.janitor_interval().map(|every| {
        tokio::spawn(janitor(
            store.clone(),
            config.merged_dir.clone(),
            every,
            config.stale_after(),
            cancel.clone(),
        ))
    });

    // -- HTTP --
    let state = AppState::new(assembler, catalog, queue, config.upload_config());
    let listener = TcpListener::bind(config.bind).await?;
    let mut server = tokio::spawn(serve(listener, state, cancel.clone()));

    tracing::info!("ReelVault ready");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, shutting down");
        }
        result = &mut server => {
            cancel.cancel();
            return result?.map_err(Into::into);
        }
    }

    // -- Graceful shutdown --
    cancel.cancel();
    server.await??;
    let _ = transcode_task.await;
    if let Some(task) = janitor_task {
        let _ = task.await;
    }

    Ok(())
}

/// Sweeps stale uploads and partial merges every `every` until cancelled.
async fn janitor(
    store: ChunkStore,
    merged_dir: PathBuf,
    every: Duration,
    max_age: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match sweep(&store, &merged_dir, max_age).await {
                    Ok(report) if report == SweepReport::default() => {
                        tracing::debug!("janitor found nothing to remove");
                    }
                    Ok(report) => tracing::info!(
                        uploads = report.uploads_removed,
                        partials = report.partials_removed,
                        "janitor sweep finished"
                    ),
                    Err(e) => tracing::warn!(error = %e, "janitor sweep failed"),
                }
            }
        }
    }
}
