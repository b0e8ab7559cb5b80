//! Identity stage.

use mesh_client::{PeerApi, PeerError};
use mesh_core::{Peer, Roster};
use mesh_types::PeerAddress;

/// Resolve the device ID of every address, in order.
///
/// All or nothing: the first failing peer aborts the stage, because
/// reconciling against an incomplete target set would unshare the folder
/// from the peer that failed to answer.
pub async fn resolve_identities<P>(peers: &P, addresses: &[PeerAddress]) -> Result<Roster, PeerError>
where
    P: PeerApi + ?Sized,
{
    let mut resolved = Vec::with_capacity(addresses.len());
    for address in addresses {
        let status = peers.status(address).await?;
        tracing::debug!(%address, device = %status.my_id, "resolved device id");
        resolved.push(Peer {
            address: address.clone(),
            device_id: status.my_id,
        });
    }
    let answered = resolved.len();
    let roster = Roster::new(resolved);
    if roster.len() < answered {
        tracing::debug!(
            addresses = answered,
            devices = roster.len(),
            "several addresses answered with the same device id"
        );
    }
    Ok(roster)
}
