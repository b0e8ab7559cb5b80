//! # stmesh-client
//!
//! Clients for the two external systems stmesh reconciles against:
//!
//! - [`MembershipProvider`]: which peers are running right now. Implemented
//!   by [`DockerMembership`] on top of the Docker Engine task API.
//! - [`PeerApi`]: per-peer identity, device directory and folder config.
//!   Implemented by [`SyncthingClient`] on top of the Syncthing REST API.
//!
//! Both traits have in-memory mocks ([`MockMembership`], [`MockFleet`]) that
//! capture calls for verification.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod membership;
pub mod peer;

pub use error::BuildError;
pub use membership::{
    DockerApiConfig, DockerEndpoint, DockerMembership, MembershipError, MembershipProvider,
    MockMembership, DEFAULT_DOCKER_ENDPOINT,
};
pub use peer::{
    MockFleet, MockPeer, PeerApi, PeerCall, PeerError, PeerOp, SyncthingApiConfig, SyncthingClient,
};
