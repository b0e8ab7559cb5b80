//! # stmesh-core
//!
//! Pure reconciliation planning for stmesh (no I/O, instant tests).
//!
//! Every function here takes the state fetched from peers during one cycle
//! and returns what should change. Nothing is remembered between calls.
//!
//! The actual I/O (Docker, Syncthing REST) is performed by `stmesh-client`,
//! and the daemon applies the plans produced here in program order.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cycle;
pub mod pairing;
pub mod roster;
pub mod sharing;

pub use cycle::{CycleReport, Stage};
pub use pairing::missing_devices;
pub use roster::{dedup_addresses, Peer, Roster};
pub use sharing::{plan_sharing, same_members, SharingDecision};
