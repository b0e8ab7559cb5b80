//! Process signal handling.
//!
//! SIGINT and SIGTERM (what `docker stop` sends) both request a graceful
//! stop. The request is broadcast on a watch channel so the driver and the
//! HTTP server can each wind down at their own boundary.

use tokio::sync::watch;

/// Sending half of the shutdown channel.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    /// Ask every subscriber to stop. Idempotent.
    pub fn trigger(&self) {
        // No subscriber left means nothing to stop.
        let _ = self.0.send(true);
    }

    /// A new receiver for the shutdown flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.0.subscribe()
    }
}

/// Create a shutdown channel in the "running" state.
pub fn channel() -> (ShutdownTrigger, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), rx)
}

/// Resolve once SIGINT or SIGTERM is received.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

/// Resolve once Ctrl+C is received.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
}
