//! Browser-facing HTTP app.
//!
//! Serves the upload page, keeps uploaded clips until the user asks for a
//! prediction, and exposes a one-shot JSON prediction endpoint.

mod pages;
mod routes;
mod state;


pub use routes::{build_router, ApiPrediction, HealthResponse, HttpServerError, CLIP_ID_HEADER};
pub use state::{AppState, ClipStore};

use anyhow::Context;
use std::net::SocketAddr;

/// Run the HTTP server loop until Ctrl-C.
pub async fn run_http_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", addr))?;
    tracing::info!(%addr, "HTTP server listening");

    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP router")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
