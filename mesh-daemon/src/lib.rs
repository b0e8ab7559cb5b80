//! # stmesh-daemon
//!
//! Convergence daemon keeping the Syncthing tasks of a Docker Swarm service
//! mutually paired and sharing one folder.
//!
//! Every cycle re-derives the fleet from the orchestrator and the peers
//! themselves; nothing is carried over between cycles.
//!
//! ## Architecture
//!
//! ```text
//!   Docker Engine API                 Syncthing REST (per peer)
//!          │                                   ▲
//!          │ running task addresses            │ status / devices / folders
//!          ▼                                   │
//!   ┌──────────────────────────────────────────┴──┐
//!   │              ConvergenceDriver              │
//!   │  membership → identities → pairing → sharing│
//!   └─────────────────────────────────────────────┘
//!                         │
//!                         ▼
//!               /health, /metrics (optional)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod driver;
pub mod error;
pub mod http;
pub mod metrics;
pub mod reconcile;
pub mod shutdown;

pub use config::Config;
pub use driver::{ConvergenceDriver, CycleSettings};
pub use error::{CycleError, DaemonError, StageError};

use mesh_client::{DockerApiConfig, DockerMembership, SyncthingApiConfig, SyncthingClient};
use std::path::Path;

/// Driver wired to the real Docker Engine and Syncthing APIs.
pub type LiveDriver = ConvergenceDriver<DockerMembership, SyncthingClient>;

/// Load the configuration: defaults or `path`, then the process environment.
pub fn load_config(path: Option<&Path>) -> error::Result<Config> {
    let base = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    Ok(base.with_process_env()?)
}

/// Build the HTTP clients and driver described by `config`.
pub fn build_driver(config: &Config) -> error::Result<LiveDriver> {
    let membership = DockerMembership::new(DockerApiConfig {
        endpoint: config.docker.endpoint.clone(),
        api_version: config.docker.api_version.clone(),
        request_timeout: config.request_timeout(),
    })?;

    let peers = SyncthingClient::new(SyncthingApiConfig {
        port: config.syncthing.port,
        api_key: config.syncthing.api_key.clone(),
        request_timeout: config.request_timeout(),
    })?;

    Ok(ConvergenceDriver::new(
        membership,
        peers,
        CycleSettings::from(config),
    ))
}
