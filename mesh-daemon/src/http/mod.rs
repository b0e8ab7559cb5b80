//! HTTP endpoints for stmesh-daemon.
//!
//! Provides health and metrics endpoints. Disabled unless `http.enabled`.

pub mod health;
mod metrics;

use crate::error::Result;
use crate::metrics::DaemonMetrics;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

pub use health::HealthStatus;

/// Build the HTTP router with all endpoints.
pub fn build_router(metrics: Arc<DaemonMetrics>) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(Extension(metrics))
}

/// Bind the listener for the endpoints.
pub async fn bind(address: &str) -> Result<TcpListener> {
    Ok(TcpListener::bind(address).await?)
}

/// Serve the endpoints until `shutdown` turns true.
pub async fn serve(
    listener: TcpListener,
    metrics: Arc<DaemonMetrics>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    tracing::info!(address = ?listener.local_addr().ok(), "http endpoints listening");
    axum::serve(listener, build_router(metrics))
        .with_graceful_shutdown(async move {
            // A dropped sender also means shutdown.
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}
