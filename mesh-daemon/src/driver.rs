//! The convergence driver.
//!
//! One cycle runs the stages in order:
//!
//! ```text
//! RESOLVE_MEMBERSHIP → RESOLVE_IDENTITIES → RECONCILE_PAIRING → RECONCILE_SHARING
//!         │                    │                    │                   │
//!         └────────────────────┴──── error ─────────┴───────────────────┘
//!                                       │
//!                                       ▼
//!                                     SLEEP ──► next cycle
//! ```
//!
//! A stage error abandons the rest of the cycle. There is no retry within a
//! cycle and no backoff: the next cycle starts from scratch after the fixed
//! interval. Cycles never overlap.

use crate::config::Config;
use crate::error::CycleError;
use crate::metrics::DaemonMetrics;
use crate::reconcile::{reconcile_pairing, reconcile_sharing, resolve_identities, resolve_membership};
use mesh_client::{MembershipProvider, PeerApi};
use mesh_core::{CycleReport, Stage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// The parts of [`Config`] the driver needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSettings {
    /// Swarm service whose tasks form the fleet.
    pub service_name: String,
    /// Folder to share across the fleet.
    pub folder: String,
    /// Delay between cycles.
    pub interval: Duration,
}

impl From<&Config> for CycleSettings {
    fn from(config: &Config) -> Self {
        Self {
            service_name: config.docker.service_name.clone(),
            folder: config.syncthing.folder.clone(),
            interval: config.interval(),
        }
    }
}

/// Drives convergence cycles against a membership provider and the peers.
pub struct ConvergenceDriver<M, P> {
    membership: M,
    peers: P,
    settings: CycleSettings,
    metrics: Arc<DaemonMetrics>,
}

impl<M, P> ConvergenceDriver<M, P>
where
    M: MembershipProvider,
    P: PeerApi,
{
    /// Create a driver with fresh metrics.
    pub fn new(membership: M, peers: P, settings: CycleSettings) -> Self {
        Self {
            membership,
            peers,
            settings,
            metrics: Arc::new(DaemonMetrics::new()),
        }
    }

    /// Get the cycle settings.
    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// Shared handle to the cycle counters.
    pub fn metrics(&self) -> Arc<DaemonMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run one full cycle, stopping at the first failing stage.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let membership = resolve_membership(&self.membership, &self.settings.service_name)
            .await
            .map_err(CycleError::at(Stage::ResolveMembership))?;
        tracing::info!(addresses = ?membership.addresses, "resolved membership");

        let roster = resolve_identities(&self.peers, &membership.addresses)
            .await
            .map_err(CycleError::at(Stage::ResolveIdentities))?;
        tracing::info!(devices = ?roster.device_ids(), "resolved identities");

        let devices_added = reconcile_pairing(&self.peers, &roster)
            .await
            .map_err(CycleError::at(Stage::ReconcilePairing))?;

        let sharing = reconcile_sharing(&self.peers, &roster, &self.settings.folder)
            .await
            .map_err(CycleError::at(Stage::ReconcileSharing))?;

        Ok(CycleReport {
            peers: roster.len(),
            addresses_reported: membership.reported,
            devices_added,
            folders_replaced: sharing.replaced,
            folders_unchanged: sharing.unchanged,
        })
    }

    /// Run one cycle, then log and record its outcome.
    pub async fn run_recorded_cycle(&self) -> Result<CycleReport, CycleError> {
        let result = self.run_cycle().await;
        match &result {
            Ok(report) => {
                self.metrics.record_success(report);
                tracing::info!(
                    peers = report.peers,
                    devices_added = report.devices_added,
                    folders_replaced = report.folders_replaced,
                    "finished cycle, waiting"
                );
            }
            Err(e) => {
                self.metrics.record_failure(e);
                tracing::error!(stage = %e.stage, "{}", e);
            }
        }
        result
    }

    /// Run cycles until `shutdown` turns true or its sender is dropped.
    ///
    /// Shutdown is observed between cycles: a running cycle always finishes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            service = %self.settings.service_name,
            folder = %self.settings.folder,
            interval_secs = self.settings.interval.as_secs(),
            "convergence loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            // Failures are already logged and counted.
            let _ = self.run_recorded_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::warn!("shutdown channel closed, stopping");
                        break;
                    }
                }
            }
        }

        tracing::info!("convergence loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageError;
    use mesh_client::{MockFleet, MockMembership, PeerCall, PeerError, PeerOp};
    use mesh_types::{DeviceId, PeerAddress};
    use std::sync::atomic::Ordering;

    const FOLDER: &str = "default";

    fn settings() -> CycleSettings {
        CycleSettings {
            service_name: "syncthing_server".into(),
            folder: FOLDER.into(),
            interval: Duration::from_secs(60),
        }
    }

    fn ids(raw: &[&str]) -> Vec<DeviceId> {
        raw.iter().map(|s| DeviceId::new(*s)).collect()
    }

    /// Three freshly started peers, each sharing the folder only with itself.
    fn fresh_fleet() -> (MockMembership, MockFleet) {
        let membership = MockMembership::with_addresses(["ip1", "ip2", "ip3"]);
        let fleet = MockFleet::new();
        for (addr, id) in [("ip1", "A"), ("ip2", "B"), ("ip3", "C")] {
            fleet.add_peer(addr, id);
            fleet.set_folder(addr, FOLDER, &[id]);
        }
        (membership, fleet)
    }

    fn assert_converged(fleet: &MockFleet, members: &[(&str, &str)]) {
        let all: Vec<&str> = members.iter().map(|(_, id)| *id).collect();
        for (addr, own) in members {
            let known = fleet.known_devices(addr);
            for id in all.iter().filter(|id| *id != own) {
                assert!(
                    known.contains(&DeviceId::new(*id)),
                    "{addr} does not know {id}"
                );
            }
            let mut shared = fleet.folder_devices(addr, FOLDER).unwrap();
            shared.sort();
            let mut expected = ids(&all);
            expected.sort();
            assert_eq!(shared, expected, "{addr} folder not shared with fleet");
        }
    }

    #[tokio::test]
    async fn one_cycle_converges_the_fleet() {
        let (membership, fleet) = fresh_fleet();
        let driver = ConvergenceDriver::new(membership, fleet.clone(), settings());

        let report = driver.run_cycle().await.unwrap();

        assert_eq!(report.peers, 3);
        assert_eq!(report.devices_added, 6);
        assert_eq!(report.folders_replaced, 3);
        assert_converged(&fleet, &[("ip1", "A"), ("ip2", "B"), ("ip3", "C")]);
    }

    #[tokio::test]
    async fn second_cycle_is_a_noop() {
        let (membership, fleet) = fresh_fleet();
        let driver = ConvergenceDriver::new(membership, fleet.clone(), settings());

        driver.run_cycle().await.unwrap();
        fleet.clear_calls();
        let report = driver.run_cycle().await.unwrap();

        assert!(report.is_noop());
        assert_eq!(report.folders_unchanged, 3);
        assert!(fleet.mutations().is_empty());
    }

    #[tokio::test]
    async fn identity_failure_blocks_all_mutations() {
        let (membership, fleet) = fresh_fleet();
        fleet.fail_on("ip3", PeerOp::Status);
        let driver = ConvergenceDriver::new(membership, fleet.clone(), settings());

        let err = driver.run_cycle().await.unwrap_err();

        assert_eq!(err.stage, Stage::ResolveIdentities);
        assert!(matches!(
            err.source,
            StageError::Peer(PeerError::Unreachable { .. })
        ));
        assert!(fleet.mutations().is_empty());
        assert!(!fleet
            .calls()
            .iter()
            .any(|c| matches!(c, PeerCall::Devices(_) | PeerCall::Folder(..))));
    }

    #[tokio::test]
    async fn membership_failure_touches_no_peer() {
        let (membership, fleet) = fresh_fleet();
        membership.fail_next("Cannot connect to the Docker daemon");
        let driver = ConvergenceDriver::new(membership, fleet.clone(), settings());

        let err = driver.run_cycle().await.unwrap_err();

        assert_eq!(err.stage, Stage::ResolveMembership);
        assert!(fleet.calls().is_empty());
    }

    #[tokio::test]
    async fn pairing_failure_skips_sharing() {
        let (membership, fleet) = fresh_fleet();
        fleet.fail_on("ip2", PeerOp::AddDevice);
        let driver = ConvergenceDriver::new(membership, fleet.clone(), settings());

        let err = driver.run_cycle().await.unwrap_err();

        assert_eq!(err.stage, Stage::ReconcilePairing);
        assert!(!fleet
            .calls()
            .iter()
            .any(|c| matches!(c, PeerCall::Folder(..) | PeerCall::SetFolderDevices(..))));
    }

    #[tokio::test]
    async fn empty_membership_completes_without_peer_calls() {
        let membership = MockMembership::new();
        let fleet = MockFleet::new();
        let driver = ConvergenceDriver::new(membership, fleet.clone(), settings());

        let report = driver.run_cycle().await.unwrap();

        assert_eq!(report, CycleReport::default());
        assert!(fleet.calls().is_empty());
    }

    #[tokio::test]
    async fn duplicate_addresses_are_reconciled_once() {
        let membership = MockMembership::with_addresses(["ip1", "ip2", "ip1"]);
        let fleet = MockFleet::new();
        fleet.add_peer("ip1", "A");
        fleet.add_peer("ip2", "B");
        fleet.set_folder("ip1", FOLDER, &["A", "B"]);
        fleet.set_folder("ip2", FOLDER, &["B", "A"]);
        fleet.set_devices("ip1", &["A", "B"]);
        fleet.set_devices("ip2", &["B", "A"]);
        let driver = ConvergenceDriver::new(membership, fleet.clone(), settings());

        let report = driver.run_cycle().await.unwrap();

        assert_eq!(report.addresses_reported, 3);
        assert_eq!(report.peers, 2);
        assert!(report.is_noop());
        let status_calls = fleet
            .calls()
            .into_iter()
            .filter(|c| *c == PeerCall::Status(PeerAddress::new("ip1")))
            .count();
        assert_eq!(status_calls, 1);
    }

    #[tokio::test]
    async fn peer_on_two_networks_converges_and_stays_converged() {
        let membership = MockMembership::with_addresses(["10.0.0.7", "10.0.1.7", "10.0.1.8"]);
        let fleet = MockFleet::new();
        fleet.add_peer("10.0.0.7", "A");
        fleet.add_alias("10.0.1.7", "10.0.0.7");
        fleet.add_peer("10.0.1.8", "B");
        fleet.set_folder("10.0.0.7", FOLDER, &["A"]);
        fleet.set_folder("10.0.1.8", FOLDER, &["B"]);
        let driver = ConvergenceDriver::new(membership, fleet.clone(), settings());

        let report = driver.run_cycle().await.unwrap();

        assert_eq!(report.addresses_reported, 3);
        assert_eq!(report.peers, 2);
        assert_eq!(report.devices_added, 2);
        assert_eq!(fleet.known_devices("10.0.1.8"), ids(&["A"]));
        assert_eq!(fleet.known_devices("10.0.1.7"), ids(&["B"]));
        assert_eq!(fleet.folder_devices("10.0.1.8", FOLDER), Some(ids(&["A", "B"])));

        fleet.clear_calls();
        let report = driver.run_cycle().await.unwrap();

        assert!(report.is_noop());
        assert!(fleet.mutations().is_empty());
    }

    #[tokio::test]
    async fn scaled_down_peer_is_unshared() {
        let (membership, fleet) = fresh_fleet();
        let driver = ConvergenceDriver::new(membership.clone(), fleet.clone(), settings());
        driver.run_cycle().await.unwrap();

        membership.set_addresses(["ip1", "ip2"]);
        fleet.remove_peer("ip3");
        driver.run_cycle().await.unwrap();

        assert_eq!(fleet.folder_devices("ip1", FOLDER), Some(ids(&["A", "B"])));
        // Pairing is additive: C stays known.
        assert!(fleet.known_devices("ip1").contains(&DeviceId::new("C")));
    }

    #[tokio::test]
    async fn recorded_cycle_updates_metrics() {
        let (membership, fleet) = fresh_fleet();
        let driver = ConvergenceDriver::new(membership.clone(), fleet, settings());
        let metrics = driver.metrics();

        driver.run_recorded_cycle().await.unwrap();
        membership.fail_next("down");
        driver.run_recorded_cycle().await.unwrap_err();

        assert_eq!(metrics.cycles_total.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.cycles_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.devices_added.load(Ordering::Relaxed), 6);
        assert_eq!(
            metrics.last_cycle().unwrap().failed_stage,
            Some(Stage::ResolveMembership)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn loop_retries_after_interval_and_stops_on_shutdown() {
        let (membership, fleet) = fresh_fleet();
        membership.fail_next("down");
        let driver = ConvergenceDriver::new(membership.clone(), fleet.clone(), settings());
        let metrics = driver.metrics();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { driver.run(rx).await });

        // Cycle at t=0 fails, cycle at t=60 succeeds, next one is due at t=120.
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(membership.queried().len(), 2);
        assert_eq!(metrics.cycles_failed.load(Ordering::Relaxed), 1);
        assert_converged(&fleet, &[("ip1", "A"), ("ip2", "B"), ("ip3", "C")]);

        tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(membership.queried().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_shutdown_sender_stops_loop() {
        let (membership, fleet) = fresh_fleet();
        let driver = ConvergenceDriver::new(membership, fleet, settings());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { driver.run(rx).await });
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop when the sender is gone")
            .unwrap();
    }

    #[test]
    fn settings_from_config() {
        let mut config = Config::default();
        config.cycle.interval_secs = 5;
        config.syncthing.folder = "music".into();

        let settings = CycleSettings::from(&config);
        assert_eq!(settings.service_name, "syncthing_server");
        assert_eq!(settings.folder, "music");
        assert_eq!(settings.interval, Duration::from_secs(5));
    }
}
