//! Docker Engine task listing payloads.

use crate::PeerAddress;
use serde::{Deserialize, Serialize};

/// The `filters` query parameter of `GET /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilters {
    /// Service names to match.
    pub service: Vec<String>,
    /// Desired task states to match.
    #[serde(rename = "desired-state")]
    pub desired_state: Vec<String>,
}

impl TaskFilters {
    /// Tasks of `service` that the orchestrator wants running.
    pub fn running(service: &str) -> Self {
        Self {
            service: vec![service.to_string()],
            desired_state: vec!["running".to_string()],
        }
    }
}

/// One network attachment of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAttachment {
    /// Addresses in CIDR notation (`10.0.1.5/24`).
    #[serde(rename = "Addresses", default)]
    pub addresses: Option<Vec<String>>,
}

/// One entry of `GET /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerTask {
    /// Task ID.
    #[serde(rename = "ID", default)]
    pub id: String,
    /// Attached networks; absent until the task is scheduled.
    #[serde(rename = "NetworksAttachments", default)]
    pub networks_attachments: Option<Vec<NetworkAttachment>>,
}

impl DockerTask {
    /// Every attached address with its prefix length removed.
    ///
    /// A task attached to several networks yields one address per network.
    pub fn addresses(&self) -> Vec<PeerAddress> {
        self.networks_attachments
            .iter()
            .flatten()
            .flat_map(|n| n.addresses.iter().flatten())
            .filter_map(|cidr| strip_prefix_len(cidr).parse().ok())
            .collect()
    }
}

/// Remove the `/NN` suffix from a CIDR address. Plain addresses pass through.
pub fn strip_prefix_len(cidr: &str) -> &str {
    cidr.split_once('/').map_or(cidr, |(host, _)| host).trim()
}
