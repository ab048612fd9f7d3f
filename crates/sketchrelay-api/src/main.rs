//! SketchRelay API server entry point.

use std::error::Error;
use std::sync::Arc;

use sketchrelay_api::config::Config;
use sketchrelay_api::routes;
use sketchrelay_api::state::AppState;
use sketchrelay_api::telemetry;
use sketchrelay_blob_store::fs_blob_store::FsBlobStore;
use sketchrelay_core::clock::SystemClock;
use sketchrelay_game::application::registry::SessionRegistry;
use sketchrelay_media::compositor::MediaCompositor;
use sketchrelay_media::font::FileFontProvider;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!(
        otlp = telemetry.exports_traces(),
        blob_root = %config.blob_root.display(),
        "Starting SketchRelay API server"
    );

    // Build application state.
    let blobs = Arc::new(FsBlobStore::new(&config.blob_root));
    let fonts = Arc::new(FileFontProvider::new(&config.font_path));
    let renderer = Arc::new(MediaCompositor::new(
        config.compositor_config(),
        fonts,
        blobs.clone(),
    ));
    let app_state = AppState::new(
        Arc::new(SystemClock),
        renderer,
        blobs,
        config.upload_size,
    );
    let registry = Arc::clone(&app_state.registry);

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::router(config.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await?;

    telemetry.shutdown()?;
    Ok(())
}

/// Resolves on Ctrl-C, after closing the registry to new sessions.
async fn shutdown_signal(registry: Arc<SessionRegistry>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    match registry.shutdown() {
        Ok(abandoned) => tracing::info!(abandoned, "shutting down; active sessions abandoned"),
        Err(e) => tracing::warn!(error = %e, "registry shutdown failed"),
    }
}
