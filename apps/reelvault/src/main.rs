//! ReelVault server entry point.

mod app;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting ReelVault"
    );

    let config = config::Config::load()?;
    tracing::info!(
        bind = %config.bind,
        uploads = %config.upload_dir.display(),
        merged = %config.merged_dir.display(),
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("ReelVault shut down cleanly");
    Ok(())
}
