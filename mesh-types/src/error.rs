//! Error types for stmesh-types.

use thiserror::Error;

/// Errors that can occur when constructing stmesh types.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Device ID was empty
    #[error("device id is empty")]
    EmptyDeviceId,

    /// Peer address was empty
    #[error("peer address is empty")]
    EmptyAddress,
}
