//! Error types for stmesh-daemon.

use mesh_client::{BuildError, MembershipError, PeerError};
use mesh_core::Stage;

/// Startup errors. Anything here stops the process.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// HTTP client could not be built.
    #[error("client error: {0}")]
    Client(#[from] BuildError),

    /// I/O error (binding the HTTP endpoint).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Orchestrator unavailable or malformed response.
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// Peer unreachable, malformed response or rejected mutation.
    #[error(transparent)]
    Peer(#[from] PeerError),
}

/// A cycle abandoned at `stage`.
///
/// Never fatal: the driver logs it and tries again next cycle.
#[derive(Debug, thiserror::Error)]
#[error("cycle failed at {stage}: {source}")]
pub struct CycleError {
    /// Stage that failed; later stages did not run.
    pub stage: Stage,
    /// What went wrong.
    #[source]
    pub source: StageError,
}

impl CycleError {
    /// Adapter for `map_err` tagging an error with its stage.
    pub fn at<E: Into<StageError>>(stage: Stage) -> impl FnOnce(E) -> CycleError {
        move |e| CycleError {
            stage,
            source: e.into(),
        }
    }
}

/// Result type alias for daemon startup.
pub type Result<T> = std::result::Result<T, DaemonError>;
