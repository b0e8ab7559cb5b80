//! Cycle counters shared with the HTTP endpoints.
//!
//! Observability only: nothing here is read back by the reconcilers.

use crate::error::CycleError;
use mesh_core::{CycleReport, Stage};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Outcome of the most recent cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastCycle {
    /// Whether the cycle completed every stage.
    pub ok: bool,
    /// Stage that failed, if any.
    pub failed_stage: Option<Stage>,
    /// Error message, if any.
    pub error: Option<String>,
    /// Summary of a successful cycle.
    pub report: Option<CycleReport>,
    /// Completion time, seconds since the Unix epoch.
    pub finished_at: u64,
}

/// Counters since startup.
#[derive(Debug)]
pub struct DaemonMetrics {
    /// Cycles run, successful or not.
    pub cycles_total: AtomicU64,
    /// Cycles abandoned on an error.
    pub cycles_failed: AtomicU64,
    /// `add device` mutations issued.
    pub devices_added: AtomicU64,
    /// Folder device lists replaced.
    pub folders_replaced: AtomicU64,
    /// Distinct peers seen by the last successful cycle.
    pub last_peers: AtomicU64,
    started: Instant,
    last_cycle: Mutex<Option<LastCycle>>,
}

impl Default for DaemonMetrics {
    fn default() -> Self {
        Self {
            cycles_total: AtomicU64::new(0),
            cycles_failed: AtomicU64::new(0),
            devices_added: AtomicU64::new(0),
            folders_replaced: AtomicU64::new(0),
            last_peers: AtomicU64::new(0),
            started: Instant::now(),
            last_cycle: Mutex::new(None),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl DaemonMetrics {
    /// Create zeroed counters starting the uptime clock now.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the counters were created.
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Record a completed cycle.
    pub fn record_success(&self, report: &CycleReport) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.devices_added
            .fetch_add(report.devices_added as u64, Ordering::Relaxed);
        self.folders_replaced
            .fetch_add(report.folders_replaced as u64, Ordering::Relaxed);
        self.last_peers.store(report.peers as u64, Ordering::Relaxed);
        self.set_last(LastCycle {
            ok: true,
            failed_stage: None,
            error: None,
            report: Some(report.clone()),
            finished_at: unix_now(),
        });
    }

    /// Record an abandoned cycle.
    pub fn record_failure(&self, error: &CycleError) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
        self.set_last(LastCycle {
            ok: false,
            failed_stage: Some(error.stage),
            error: Some(error.source.to_string()),
            report: None,
            finished_at: unix_now(),
        });
    }

    /// Outcome of the most recent cycle, `None` before the first one ends.
    pub fn last_cycle(&self) -> Option<LastCycle> {
        match self.last_cycle.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_last(&self, last: LastCycle) {
        match self.last_cycle.lock() {
            Ok(mut guard) => *guard = Some(last),
            Err(poisoned) => *poisoned.into_inner() = Some(last),
        }
    }
}
