//! Identity and addressing types for stmesh.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The stable identity of a Syncthing peer.
///
/// Issued by the peer application itself (`myID` in the status endpoint) and
/// treated as opaque. Survives restarts; unknown until resolved. Decoding
/// rejects an empty ID.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a device ID string as reported by a peer.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the device ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First block of the ID, used for compact log output.
    pub fn short(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyDeviceId);
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for DeviceId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.short())
    }
}

/// Network address of one running peer.
///
/// Only meaningful within the cycle that resolved it: tasks get new
/// addresses when they are rescheduled.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerAddress(String);

impl PeerAddress {
    /// Wrap a host string (IP address or DNS name, no port).
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }

    /// Get the host as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PeerAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyAddress);
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerAddress({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "MFZWI3D-BONSGYC-YLTMRWG-C43ENR5-QXGZDMM-FZWI3DP-BONSGYY-LTMRWAD";

    #[test]
    fn device_id_short_is_first_block() {
        let id = DeviceId::new(ID);
        assert_eq!(id.short(), "MFZWI3D");
        assert_eq!(format!("{:?}", id), "DeviceId(MFZWI3D)");
    }

    #[test]
    fn device_id_display_is_full_id() {
        assert_eq!(DeviceId::new(ID).to_string(), ID);
    }

    #[test]
    fn device_id_parse_trims_and_rejects_empty() {
        let id: DeviceId = format!("  {ID}\n").parse().unwrap();
        assert_eq!(id.as_str(), ID);
        assert!(matches!("   ".parse::<DeviceId>(), Err(TypesError::EmptyDeviceId)));
    }

    #[test]
    fn device_ids_sort_lexically() {
        let mut ids = vec![DeviceId::new("C"), DeviceId::new("A"), DeviceId::new("B")];
        ids.sort();
        assert_eq!(ids, vec![DeviceId::new("A"), DeviceId::new("B"), DeviceId::new("C")]);
    }

    #[test]
    fn peer_address_parse() {
        let addr: PeerAddress = "10.0.1.5".parse().unwrap();
        assert_eq!(addr.as_str(), "10.0.1.5");
        assert!(matches!("".parse::<PeerAddress>(), Err(TypesError::EmptyAddress)));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&DeviceId::new("AAA")).unwrap();
        assert_eq!(json, "\"AAA\"");
        let addr: PeerAddress = serde_json::from_str("\"10.0.0.2\"").unwrap();
        assert_eq!(addr, PeerAddress::new("10.0.0.2"));
    }

    #[test]
    fn device_id_decode_rejects_blank() {
        assert!(serde_json::from_str::<DeviceId>("\"  \"").is_err());
        let id: DeviceId = serde_json::from_str("\"AAA\"").unwrap();
        assert_eq!(id, DeviceId::new("AAA"));
    }
}
