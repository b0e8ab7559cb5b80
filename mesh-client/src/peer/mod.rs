//! Per-peer Syncthing operations.
//!
//! [`PeerApi`] covers the five calls stmesh needs from a peer: read its
//! identity, read and extend its device directory, read and replace one
//! folder's device list.

mod mock;
mod syncthing;

pub use mock::{MockFleet, MockPeer, PeerCall, PeerOp};
pub use syncthing::{SyncthingApiConfig, SyncthingClient, API_KEY_HEADER};

use async_trait::async_trait;
use mesh_types::{DeviceId, FolderConfig, NewDevice, PeerAddress, SystemStatus};
use thiserror::Error;

/// Peer API errors.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Request could not be delivered (refused, timed out, reset).
    #[error("peer {address} unreachable: {reason}")]
    Unreachable {
        /// Address of the peer.
        address: PeerAddress,
        /// Transport error message.
        reason: String,
    },

    /// Peer answered with a non-success status.
    #[error("peer {address} rejected request with status {status}: {body}")]
    Rejected {
        /// Address of the peer.
        address: PeerAddress,
        /// HTTP status code.
        status: u16,
        /// Response body, trimmed.
        body: String,
    },

    /// Peer answered with a body that could not be decoded.
    #[error("peer {address} sent malformed response: {reason}")]
    Malformed {
        /// Address of the peer.
        address: PeerAddress,
        /// Decode error message.
        reason: String,
    },
}

impl PeerError {
    /// Address of the peer that failed.
    pub fn address(&self) -> &PeerAddress {
        match self {
            PeerError::Unreachable { address, .. }
            | PeerError::Rejected { address, .. }
            | PeerError::Malformed { address, .. } => address,
        }
    }
}

/// The peer application's REST surface, as used by the reconcilers.
#[async_trait]
pub trait PeerApi: Send + Sync {
    /// The peer's self-reported status, carrying its device ID.
    async fn status(&self, address: &PeerAddress) -> Result<SystemStatus, PeerError>;

    /// Device IDs currently in the peer's device directory.
    async fn devices(&self, address: &PeerAddress) -> Result<Vec<DeviceId>, PeerError>;

    /// Add one device to the peer's directory.
    async fn add_device(&self, address: &PeerAddress, device: &NewDevice) -> Result<(), PeerError>;

    /// Configuration of one folder.
    async fn folder(&self, address: &PeerAddress, folder: &str)
        -> Result<FolderConfig, PeerError>;

    /// Replace a folder's device list with exactly `devices`.
    async fn set_folder_devices(
        &self,
        address: &PeerAddress,
        folder: &str,
        devices: &[DeviceId],
    ) -> Result<(), PeerError>;
}
