//! Health check endpoint.

use crate::metrics::{DaemonMetrics, LastCycle};
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Health status response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// `ok`, `degraded` when the last cycle failed, `starting` before the first one ends.
    pub status: String,
    /// Daemon version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    /// Cycles run since startup.
    pub cycles_total: u64,
    /// Cycles abandoned since startup.
    pub cycles_failed: u64,
    /// Outcome of the most recent cycle.
    pub last_cycle: Option<LastCycle>,
}

impl HealthStatus {
    /// Snapshot the current counters.
    pub fn from_metrics(metrics: &DaemonMetrics) -> Self {
        let last_cycle = metrics.last_cycle();
        let status = match &last_cycle {
            None => "starting",
            Some(last) if last.ok => "ok",
            Some(_) => "degraded",
        };

        Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: metrics.uptime_secs(),
            cycles_total: metrics.cycles_total.load(Ordering::Relaxed),
            cycles_failed: metrics.cycles_failed.load(Ordering::Relaxed),
            last_cycle,
        }
    }
}

/// Health check handler.
pub async fn health_handler(Extension(metrics): Extension<Arc<DaemonMetrics>>) -> Json<HealthStatus> {
    Json(HealthStatus::from_metrics(&metrics))
}
