//! Cycle stages and outcome summaries.

use serde::Serialize;
use std::fmt;

/// The steps of one convergence cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Ask the orchestrator which tasks are running.
    ResolveMembership,
    /// Ask every peer for its device ID.
    ResolveIdentities,
    /// Add missing devices on every peer.
    ReconcilePairing,
    /// Make every peer's folder shared with exactly the fleet.
    ReconcileSharing,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [
        Stage::ResolveMembership,
        Stage::ResolveIdentities,
        Stage::ReconcilePairing,
        Stage::ReconcileSharing,
    ];

    /// Stable lowercase name, used in logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ResolveMembership => "resolve_membership",
            Stage::ResolveIdentities => "resolve_identities",
            Stage::ReconcilePairing => "reconcile_pairing",
            Stage::ReconcileSharing => "reconcile_sharing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one successful cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Distinct peers reconciled.
    pub peers: usize,
    /// Addresses reported by the orchestrator before deduplication.
    pub addresses_reported: usize,
    /// `add device` mutations issued.
    pub devices_added: usize,
    /// Folders whose device list was replaced.
    pub folders_replaced: usize,
    /// Folders already shared with exactly the fleet.
    pub folders_unchanged: usize,
}

impl CycleReport {
    /// Number of mutations issued during the cycle.
    pub fn mutations(&self) -> usize {
        self.devices_added + self.folders_replaced
    }

    /// True when the fleet was already converged.
    pub fn is_noop(&self) -> bool {
        self.mutations() == 0
    }
}
