//! Membership stage.

use mesh_client::{MembershipError, MembershipProvider};
use mesh_core::dedup_addresses;
use mesh_types::PeerAddress;

/// Addresses taking part in this cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    /// How many addresses the orchestrator reported, duplicates included.
    pub reported: usize,
    /// Distinct addresses in first-seen order.
    pub addresses: Vec<PeerAddress>,
}

/// Ask the orchestrator for the running tasks of `service`.
pub async fn resolve_membership<M>(
    membership: &M,
    service: &str,
) -> Result<Membership, MembershipError>
where
    M: MembershipProvider + ?Sized,
{
    let raw = membership.running_task_addresses(service).await?;
    let reported = raw.len();
    let addresses = dedup_addresses(raw);

    if addresses.len() < reported {
        tracing::debug!(
            reported,
            distinct = addresses.len(),
            "dropped duplicate task addresses"
        );
    }

    Ok(Membership {
        reported,
        addresses,
    })
}
