//! Membership resolution.
//!
//! A [`MembershipProvider`] answers one question: at which addresses are the
//! running tasks of a service reachable right now?
//!
//! # Example
//!
//! ```ignore
//! let docker = DockerMembership::new(DockerApiConfig::default())?;
//! let addresses = docker.running_task_addresses("syncthing_server").await?;
//! ```

mod docker;
mod mock;

pub use docker::{DockerApiConfig, DockerEndpoint, DockerMembership, DEFAULT_DOCKER_ENDPOINT};
pub use mock::MockMembership;

use async_trait::async_trait;
use mesh_types::PeerAddress;
use thiserror::Error;

/// Membership errors.
#[derive(Debug, Error)]
pub enum MembershipError {
    /// Orchestrator unreachable or returned a non-success status.
    #[error("membership unavailable: {0}")]
    Unavailable(String),

    /// Orchestrator answered with something that is not a task list.
    #[error("malformed membership response: {0}")]
    Malformed(String),
}

/// Source of the current set of running peers.
#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// Addresses of every running task of `service`.
    ///
    /// One address per network attachment; duplicates are not removed.
    /// No running task yields an empty vector, not an error.
    async fn running_task_addresses(
        &self,
        service: &str,
    ) -> Result<Vec<PeerAddress>, MembershipError>;
}
