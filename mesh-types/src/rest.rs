//! Syncthing REST payloads.
//!
//! Only the fields stmesh reads or writes are modelled; everything else the
//! peer returns is ignored on decode and left untouched by the peer on
//! `POST`/`PATCH`.

use crate::DeviceId;
use serde::{Deserialize, Serialize};

/// Response of `GET /rest/system/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// The peer's own device ID.
    #[serde(rename = "myID")]
    pub my_id: DeviceId,
}

/// One entry of `GET /rest/config/devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Paired device ID.
    #[serde(rename = "deviceID")]
    pub device_id: DeviceId,
}

/// Body of `POST /rest/config/devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    /// Device ID to pair with.
    #[serde(rename = "deviceID")]
    pub device_id: DeviceId,
    /// Accept folders shared by this device without confirmation.
    #[serde(rename = "autoAcceptFolders")]
    pub auto_accept_folders: bool,
}

impl NewDevice {
    /// A pairing that auto-accepts folders shared by `device_id`.
    pub fn auto_accept(device_id: DeviceId) -> Self {
        Self {
            device_id,
            auto_accept_folders: true,
        }
    }
}

/// A device entry inside a folder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDevice {
    /// Device the folder is shared with.
    #[serde(rename = "deviceID")]
    pub device_id: DeviceId,
}

/// Response of `GET /rest/config/folders/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderConfig {
    /// Folder ID.
    pub id: String,
    /// Folder label.
    #[serde(default)]
    pub label: String,
    /// Devices the folder is shared with (includes the peer itself).
    #[serde(default)]
    pub devices: Vec<FolderDevice>,
}

impl FolderConfig {
    /// The folder's sharing set, in the order the peer reported it.
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.iter().map(|d| d.device_id.clone()).collect()
    }
}

/// Body of `PATCH /rest/config/folders/{id}` replacing the sharing set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDevicesPatch {
    /// Complete replacement device list.
    pub devices: Vec<FolderDevice>,
}

impl FolderDevicesPatch {
    /// Build a patch listing exactly `ids`.
    pub fn from_ids(ids: &[DeviceId]) -> Self {
        Self {
            devices: ids
                .iter()
                .cloned()
                .map(|device_id| FolderDevice { device_id })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_decodes_my_id_and_ignores_rest() {
        let json = r#"{"myID":"AAAAAAA-BBB","uptime":42,"goroutine":17}"#;
        let status: SystemStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.my_id, DeviceId::new("AAAAAAA-BBB"));
    }

    #[test]
    fn devices_decode() {
        let json = r#"[{"deviceID":"A","name":"one","addresses":["dynamic"]},{"deviceID":"B"}]"#;
        let devices: Vec<DeviceConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device_id, DeviceId::new("A"));
        assert_eq!(devices[1].device_id, DeviceId::new("B"));
    }

    #[test]
    fn empty_my_id_is_rejected() {
        let err = serde_json::from_str::<SystemStatus>(r#"{"myID":""}"#).unwrap_err();
        assert!(err.to_string().contains("device id is empty"));
    }

    #[test]
    fn new_device_uses_syncthing_field_names() {
        let body = serde_json::to_value(NewDevice::auto_accept(DeviceId::new("C"))).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "deviceID": "C", "autoAcceptFolders": true })
        );
    }

    #[test]
    fn folder_device_ids_keep_peer_order() {
        let json = r#"{"id":"default","label":"Default Folder","path":"/var/syncthing",
            "devices":[{"deviceID":"B","introducedBy":""},{"deviceID":"A"}]}"#;
        let folder: FolderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(folder.id, "default");
        assert_eq!(folder.device_ids(), vec![DeviceId::new("B"), DeviceId::new("A")]);
    }

    #[test]
    fn folder_without_devices_is_empty() {
        let folder: FolderConfig = serde_json::from_str(r#"{"id":"default"}"#).unwrap();
        assert!(folder.device_ids().is_empty());
    }

    #[test]
    fn patch_lists_exactly_the_given_ids() {
        let patch = FolderDevicesPatch::from_ids(&[DeviceId::new("A"), DeviceId::new("B")]);
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "devices": [{ "deviceID": "A" }, { "deviceID": "B" }] })
        );
    }
}
