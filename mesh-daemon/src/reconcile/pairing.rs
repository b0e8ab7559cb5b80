//! Pairing stage.

use mesh_client::{PeerApi, PeerError};
use mesh_core::{missing_devices, Roster};
use mesh_types::NewDevice;

/// Make every peer know every other peer. Returns the number of devices added.
///
/// Devices are added with folder auto-accept so that the sharing stage (on
/// the other side) is picked up without confirmation.
pub async fn reconcile_pairing<P>(peers: &P, roster: &Roster) -> Result<usize, PeerError>
where
    P: PeerApi + ?Sized,
{
    let target = roster.device_ids();
    let mut added = 0;

    for peer in roster.peers() {
        let known = peers.devices(&peer.address).await?;
        let missing = missing_devices(&known, &target, &peer.device_id);

        if missing.is_empty() {
            tracing::debug!(address = %peer.address, "peer already paired with fleet");
            continue;
        }

        for device_id in missing {
            tracing::info!(address = %peer.address, device = %device_id, "adding device");
            peers
                .add_device(&peer.address, &NewDevice::auto_accept(device_id))
                .await?;
            added += 1;
        }
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::resolve_identities;
    use mesh_client::{MockFleet, PeerCall, PeerOp};
    use mesh_types::{DeviceId, PeerAddress};

    async fn roster(fleet: &MockFleet, raw: &[&str]) -> Roster {
        let addresses: Vec<PeerAddress> = raw.iter().map(|s| PeerAddress::new(*s)).collect();
        resolve_identities(fleet, &addresses).await.unwrap()
    }

    fn add(address: &str, device: &str) -> PeerCall {
        PeerCall::AddDevice(PeerAddress::new(address), DeviceId::new(device))
    }

    #[tokio::test]
    async fn three_peer_scenario() {
        let fleet = MockFleet::new();
        fleet.add_peer("ip1", "A");
        fleet.add_peer("ip2", "B");
        fleet.add_peer("ip3", "C");
        fleet.set_devices("ip1", &["B"]);
        fleet.set_devices("ip2", &["A", "C"]);
        let roster = roster(&fleet, &["ip1", "ip2", "ip3"]).await;

        let added = reconcile_pairing(&fleet, &roster).await.unwrap();

        assert_eq!(added, 3);
        assert_eq!(
            fleet.mutations(),
            vec![add("ip1", "C"), add("ip3", "A"), add("ip3", "B")]
        );
        let ip3 = fleet.peer("ip3").unwrap();
        assert!(ip3.auto_accept.values().all(|accept| *accept));
    }

    #[tokio::test]
    async fn second_run_adds_nothing() {
        let fleet = MockFleet::new();
        fleet.add_peer("ip1", "A");
        fleet.add_peer("ip2", "B");
        let roster = roster(&fleet, &["ip1", "ip2"]).await;

        assert_eq!(reconcile_pairing(&fleet, &roster).await.unwrap(), 2);
        fleet.clear_calls();
        assert_eq!(reconcile_pairing(&fleet, &roster).await.unwrap(), 0);
        assert!(fleet.mutations().is_empty());
    }

    #[tokio::test]
    async fn self_listed_in_directory_is_not_an_issue() {
        // Real peers list themselves in their own device directory.
        let fleet = MockFleet::new();
        fleet.add_peer("ip1", "A");
        fleet.add_peer("ip2", "B");
        fleet.set_devices("ip1", &["A", "B"]);
        fleet.set_devices("ip2", &["B", "A"]);
        let roster = roster(&fleet, &["ip1", "ip2"]).await;

        assert_eq!(reconcile_pairing(&fleet, &roster).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejected_add_aborts_stage() {
        let fleet = MockFleet::new();
        fleet.add_peer("ip1", "A");
        fleet.add_peer("ip2", "B");
        fleet.fail_on("ip1", PeerOp::AddDevice);
        let roster = roster(&fleet, &["ip1", "ip2"]).await;

        let err = reconcile_pairing(&fleet, &roster).await.unwrap_err();
        assert!(matches!(err, PeerError::Rejected { status: 500, .. }));
        // ip2 was never reached.
        assert!(fleet.known_devices("ip2").is_empty());
        assert!(!fleet
            .calls()
            .contains(&PeerCall::Devices(PeerAddress::new("ip2"))));
    }
}
