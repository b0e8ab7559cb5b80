//! In-memory fleet of Syncthing peers for testing.
//!
//! Behaves like the real REST API where it matters for reconciliation:
//! adding an already-known device is rejected, unknown folders are 404,
//! unknown addresses are unreachable. Every call is recorded in order.

use super::{PeerApi, PeerError};
use async_trait::async_trait;
use mesh_types::{DeviceId, FolderConfig, FolderDevice, NewDevice, PeerAddress, SystemStatus};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// State of one simulated peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPeer {
    /// The peer's own device ID.
    pub device_id: DeviceId,
    /// Device directory, in insertion order.
    pub devices: Vec<DeviceId>,
    /// Folder ID to sharing set.
    pub folders: HashMap<String, Vec<DeviceId>>,
    /// Auto-accept flag of every device added through the API.
    pub auto_accept: HashMap<DeviceId, bool>,
}

/// Which operation a forced failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerOp {
    /// `status`
    Status,
    /// `devices`
    Devices,
    /// `add_device`
    AddDevice,
    /// `folder`
    Folder,
    /// `set_folder_devices`
    SetFolderDevices,
}

/// A recorded API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCall {
    /// `status(address)`
    Status(PeerAddress),
    /// `devices(address)`
    Devices(PeerAddress),
    /// `add_device(address, device)`
    AddDevice(PeerAddress, DeviceId),
    /// `folder(address, folder)`
    Folder(PeerAddress, String),
    /// `set_folder_devices(address, folder, devices)`
    SetFolderDevices(PeerAddress, String, Vec<DeviceId>),
}

impl PeerCall {
    /// True for calls that change peer state.
    pub fn is_mutation(&self) -> bool {
        matches!(self, PeerCall::AddDevice(..) | PeerCall::SetFolderDevices(..))
    }
}

/// Mock fleet implementing [`PeerApi`].
#[derive(Debug, Default)]
pub struct MockFleet {
    inner: Arc<Mutex<MockFleetInner>>,
}

#[derive(Debug, Default)]
struct MockFleetInner {
    peers: HashMap<PeerAddress, MockPeer>,
    aliases: HashMap<PeerAddress, PeerAddress>,
    calls: Vec<PeerCall>,
    failures: HashSet<(PeerAddress, PeerOp)>,
}

impl MockFleetInner {
    fn check(&self, address: &PeerAddress, op: PeerOp) -> Result<(), PeerError> {
        if !self.failures.contains(&(address.clone(), op)) {
            return Ok(());
        }
        match op {
            PeerOp::AddDevice | PeerOp::SetFolderDevices => Err(PeerError::Rejected {
                address: address.clone(),
                status: 500,
                body: "injected failure".into(),
            }),
            _ => Err(PeerError::Unreachable {
                address: address.clone(),
                reason: "injected failure".into(),
            }),
        }
    }

    fn resolve(&self, address: &PeerAddress) -> PeerAddress {
        self.aliases
            .get(address)
            .cloned()
            .unwrap_or_else(|| address.clone())
    }

    fn peer_mut(&mut self, address: &PeerAddress) -> Result<&mut MockPeer, PeerError> {
        let key = self.resolve(address);
        self.peers
            .get_mut(&key)
            .ok_or_else(|| PeerError::Unreachable {
                address: address.clone(),
                reason: "connection refused".into(),
            })
    }
}

fn folder_not_found(address: &PeerAddress, folder: &str) -> PeerError {
    PeerError::Rejected {
        address: address.clone(),
        status: 404,
        body: format!("no folder with id {}", folder),
    }
}

impl MockFleet {
    /// Create an empty fleet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a peer at `address` with an empty directory and no folders.
    pub fn add_peer(&self, address: &str, device_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.peers.insert(
            PeerAddress::new(address),
            MockPeer {
                device_id: DeviceId::new(device_id),
                devices: Vec::new(),
                folders: HashMap::new(),
                auto_accept: HashMap::new(),
            },
        );
    }

    /// Make `alias` reach the peer at `address`, like a second network
    /// attachment of the same task.
    pub fn add_alias(&self, alias: &str, address: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .aliases
            .insert(PeerAddress::new(alias), PeerAddress::new(address));
    }

    /// Stop the peer at `address`; it becomes unreachable.
    pub fn remove_peer(&self, address: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.peers.remove(&PeerAddress::new(address));
    }

    /// Overwrite a peer's device directory.
    pub fn set_devices(&self, address: &str, devices: &[&str]) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(peer) = inner.peers.get_mut(&PeerAddress::new(address)) {
            peer.devices = devices.iter().map(|d| DeviceId::new(*d)).collect();
        }
    }

    /// Overwrite (or create) a folder's sharing set on a peer.
    pub fn set_folder(&self, address: &str, folder: &str, devices: &[&str]) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(peer) = inner.peers.get_mut(&PeerAddress::new(address)) {
            peer.folders.insert(
                folder.to_string(),
                devices.iter().map(|d| DeviceId::new(*d)).collect(),
            );
        }
    }

    /// Make every `op` against `address` fail until cleared.
    pub fn fail_on(&self, address: &str, op: PeerOp) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.insert((PeerAddress::new(address), op));
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.clear();
    }

    /// Snapshot of a peer's state.
    pub fn peer(&self, address: &str) -> Option<MockPeer> {
        let inner = self.inner.lock().unwrap();
        let key = inner.resolve(&PeerAddress::new(address));
        inner.peers.get(&key).cloned()
    }

    /// A peer's device directory.
    pub fn known_devices(&self, address: &str) -> Vec<DeviceId> {
        self.peer(address).map(|p| p.devices).unwrap_or_default()
    }

    /// A peer's sharing set for `folder`, if the folder exists.
    pub fn folder_devices(&self, address: &str, folder: &str) -> Option<Vec<DeviceId>> {
        self.peer(address).and_then(|p| p.folders.get(folder).cloned())
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<PeerCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.clone()
    }

    /// Mutating calls so far, in order.
    pub fn mutations(&self) -> Vec<PeerCall> {
        self.calls().into_iter().filter(PeerCall::is_mutation).collect()
    }

    /// Forget recorded calls, keeping peer state.
    pub fn clear_calls(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.clear();
    }
}

impl Clone for MockFleet {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PeerApi for MockFleet {
    async fn status(&self, address: &PeerAddress) -> Result<SystemStatus, PeerError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(PeerCall::Status(address.clone()));
        inner.check(address, PeerOp::Status)?;

        let peer = inner.peer_mut(address)?;
        Ok(SystemStatus {
            my_id: peer.device_id.clone(),
        })
    }

    async fn devices(&self, address: &PeerAddress) -> Result<Vec<DeviceId>, PeerError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(PeerCall::Devices(address.clone()));
        inner.check(address, PeerOp::Devices)?;

        Ok(inner.peer_mut(address)?.devices.clone())
    }

    async fn add_device(&self, address: &PeerAddress, device: &NewDevice) -> Result<(), PeerError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .calls
            .push(PeerCall::AddDevice(address.clone(), device.device_id.clone()));
        inner.check(address, PeerOp::AddDevice)?;

        let peer = inner.peer_mut(address)?;
        if peer.devices.contains(&device.device_id) {
            return Err(PeerError::Rejected {
                address: address.clone(),
                status: 400,
                body: format!("device {} already exists", device.device_id),
            });
        }
        peer.devices.push(device.device_id.clone());
        peer.auto_accept
            .insert(device.device_id.clone(), device.auto_accept_folders);
        Ok(())
    }

    async fn folder(
        &self,
        address: &PeerAddress,
        folder: &str,
    ) -> Result<FolderConfig, PeerError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .calls
            .push(PeerCall::Folder(address.clone(), folder.to_string()));
        inner.check(address, PeerOp::Folder)?;

        let peer = inner.peer_mut(address)?;
        let devices = peer
            .folders
            .get(folder)
            .ok_or_else(|| folder_not_found(address, folder))?;
        Ok(FolderConfig {
            id: folder.to_string(),
            label: String::new(),
            devices: devices
                .iter()
                .cloned()
                .map(|device_id| FolderDevice { device_id })
                .collect(),
        })
    }

    async fn set_folder_devices(
        &self,
        address: &PeerAddress,
        folder: &str,
        devices: &[DeviceId],
    ) -> Result<(), PeerError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(PeerCall::SetFolderDevices(
            address.clone(),
            folder.to_string(),
            devices.to_vec(),
        ));
        inner.check(address, PeerOp::SetFolderDevices)?;

        let peer = inner.peer_mut(address)?;
        let shared = peer
            .folders
            .get_mut(folder)
            .ok_or_else(|| folder_not_found(address, folder))?;
        *shared = devices.to_vec();
        Ok(())
    }
}
