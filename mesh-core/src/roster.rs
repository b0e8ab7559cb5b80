//! The peers taking part in one cycle.

use mesh_types::{DeviceId, PeerAddress};
use std::collections::HashSet;

/// One running peer with its resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Where the peer can be reached this cycle.
    pub address: PeerAddress,
    /// The peer's own device ID.
    pub device_id: DeviceId,
}

/// Distinct peers with their identities, in membership order.
///
/// Built only once every identity is known: there is no partially
/// resolved roster. Each device ID appears once. A task attached to several
/// networks answers on several addresses with the same identity; only the
/// first address is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    peers: Vec<Peer>,
}

impl Roster {
    /// Build a roster from fully resolved peers, dropping repeated identities.
    pub fn new(peers: Vec<Peer>) -> Self {
        let mut seen = HashSet::with_capacity(peers.len());
        let peers = peers
            .into_iter()
            .filter(|peer| seen.insert(peer.device_id.clone()))
            .collect();
        Self { peers }
    }

    /// Peers in processing order.
    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// The target identity set, in processing order.
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.peers.iter().map(|p| p.device_id.clone()).collect()
    }

    /// Number of peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// True when membership was empty.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Drop repeated addresses, keeping the first occurrence and the order.
///
/// Saves a second status call for an address the orchestrator reported
/// twice. Distinct addresses of one peer are folded by [`Roster::new`].
pub fn dedup_addresses(addresses: Vec<PeerAddress>) -> Vec<PeerAddress> {
    let mut seen = HashSet::with_capacity(addresses.len());
    addresses
        .into_iter()
        .filter(|addr| seen.insert(addr.clone()))
        .collect()
}
