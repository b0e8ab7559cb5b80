//! Prometheus metrics endpoint.

use crate::metrics::DaemonMetrics;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
pub async fn metrics_handler(Extension(metrics): Extension<Arc<DaemonMetrics>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        render(&metrics),
    )
}

/// Render the counters in Prometheus text format.
fn render(m: &DaemonMetrics) -> String {
    let cycles = m.cycles_total.load(Ordering::Relaxed);
    let failed = m.cycles_failed.load(Ordering::Relaxed);
    let added = m.devices_added.load(Ordering::Relaxed);
    let replaced = m.folders_replaced.load(Ordering::Relaxed);
    let peers = m.last_peers.load(Ordering::Relaxed);
    let ok = m.last_cycle().map(|last| u8::from(last.ok)).unwrap_or(0);

    format!(
        r#"# HELP stmesh_info Daemon information
# TYPE stmesh_info gauge
stmesh_info{{version="{version}"}} 1

# HELP stmesh_cycles_total Convergence cycles run
# TYPE stmesh_cycles_total counter
stmesh_cycles_total {cycles}

# HELP stmesh_cycles_failed_total Convergence cycles abandoned on error
# TYPE stmesh_cycles_failed_total counter
stmesh_cycles_failed_total {failed}

# HELP stmesh_devices_added_total Devices added to peers
# TYPE stmesh_devices_added_total counter
stmesh_devices_added_total {added}

# HELP stmesh_folders_replaced_total Folder device lists replaced
# TYPE stmesh_folders_replaced_total counter
stmesh_folders_replaced_total {replaced}

# HELP stmesh_peers Peers seen by the last successful cycle
# TYPE stmesh_peers gauge
stmesh_peers {peers}

# HELP stmesh_last_cycle_ok Whether the last cycle completed
# TYPE stmesh_last_cycle_ok gauge
stmesh_last_cycle_ok {ok}
"#,
        version = env!("CARGO_PKG_VERSION"),
    )
}
