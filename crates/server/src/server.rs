use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ServerError;
use crate::handlers;
use crate::state::AppState;

/// Builds the application router.
///
/// The body limit is lifted because the chunk store enforces the per-upload
/// ceiling itself while streaming.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/upload",
            post(handlers::upload_chunk).get(handlers::probe_chunk),
        )
        .route("/merge", post(handlers::merge))
        .route("/config", get(handlers::upload_config))
        .route("/videos", get(handlers::list_artifacts))
        .route("/videos/:filename", get(handlers::stream_artifact))
        .route("/compression-status", get(handlers::compression_status))
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on `listener` until `cancel` fires, then drains
/// in-flight requests.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
