//! stmesh binary entry point.
//!
//! Usage:
//! ```bash
//! stmesh                      # defaults + environment
//! stmesh --config stmesh.toml
//! stmesh --once               # single cycle, exit status reflects outcome
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stmesh_daemon::{build_driver, http, load_config, shutdown};
use tracing_subscriber::EnvFilter;

/// Keeps a Syncthing swarm service paired and sharing one folder.
#[derive(Parser, Debug)]
#[command(name = "stmesh")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file (environment variables override it)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let driver = build_driver(&config).context("Failed to build clients")?;

    if cli.once {
        driver.run_recorded_cycle().await?;
        return Ok(());
    }

    let (trigger, shutdown_rx) = shutdown::channel();

    let http_task = if config.http.enabled {
        let listener = http::bind(&config.http.bind_address)
            .await
            .with_context(|| format!("Failed to bind {}", config.http.bind_address))?;
        Some(tokio::spawn(http::serve(
            listener,
            driver.metrics(),
            trigger.subscribe(),
        )))
    } else {
        None
    };

    let driver_task = tokio::spawn(async move { driver.run(shutdown_rx).await });

    let signal = shutdown::wait_for_signal()
        .await
        .context("Failed to listen for shutdown signals")?;
    tracing::info!(signal, "shutting down after current cycle");
    trigger.trigger();

    driver_task.await.context("Convergence loop panicked")?;
    if let Some(task) = http_task {
        task.await
            .context("HTTP server panicked")?
            .context("HTTP server failed")?;
    }

    tracing::info!("stopped");
    Ok(())
}
