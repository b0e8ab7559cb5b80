//! # stmesh-types
//!
//! Identity and wire format types for stmesh.
//!
//! This crate provides the foundational types used across all stmesh crates:
//! - [`DeviceId`], [`PeerAddress`] - Identity and addressing types
//! - [`SystemStatus`], [`DeviceConfig`], [`NewDevice`], [`FolderConfig`] - Syncthing REST payloads
//! - [`DockerTask`], [`TaskFilters`] - Docker Engine task listing payloads
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod docker;
mod error;
mod ids;
mod rest;

pub use docker::{strip_prefix_len, DockerTask, NetworkAttachment, TaskFilters};
pub use error::TypesError;
pub use ids::{DeviceId, PeerAddress};
pub use rest::{DeviceConfig, FolderConfig, FolderDevice, FolderDevicesPatch, NewDevice, SystemStatus};
