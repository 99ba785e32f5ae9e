//! Liveness endpoint for orchestration probes.

use axum::Router;
use axum::routing::get;
use tracing::info;

async fn liveness() -> &'static str {
    "Video Editor Bot Running! 🎬"
}

/// Serve `GET /` and `GET /health` until the process exits.
pub async fn serve(port: u16) -> std::io::Result<()> {
    let app = Router::new()
        .route("/", get(liveness))
        .route("/health", get(liveness));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("🌐 Health endpoint on port {}", port);
    axum::serve(listener, app).await
}
