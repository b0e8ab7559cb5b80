//! Folder-sharing stage.

use mesh_client::{PeerApi, PeerError};
use mesh_core::{plan_sharing, Roster, SharingDecision};

/// What the sharing stage did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SharingOutcome {
    /// Folders whose device list was replaced.
    pub replaced: usize,
    /// Folders already shared with exactly the fleet.
    pub unchanged: usize,
}

/// Make `folder` on every peer shared with exactly the fleet.
///
/// A differing device list is replaced wholesale, which also drops devices
/// that left the fleet.
pub async fn reconcile_sharing<P>(
    peers: &P,
    roster: &Roster,
    folder: &str,
) -> Result<SharingOutcome, PeerError>
where
    P: PeerApi + ?Sized,
{
    let target = roster.device_ids();
    let mut outcome = SharingOutcome::default();

    for peer in roster.peers() {
        let config = peers.folder(&peer.address, folder).await?;

        match plan_sharing(&config.device_ids(), &target) {
            SharingDecision::Unchanged => {
                tracing::debug!(address = %peer.address, folder, "folder already shared with fleet");
                outcome.unchanged += 1;
            }
            SharingDecision::Replace(devices) => {
                tracing::info!(
                    address = %peer.address,
                    folder,
                    devices = devices.len(),
                    "replacing folder devices"
                );
                peers
                    .set_folder_devices(&peer.address, folder, &devices)
                    .await?;
                outcome.replaced += 1;
            }
        }
    }

    Ok(outcome)
}
