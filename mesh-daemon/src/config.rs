//! Configuration loading for stmesh.
//!
//! Configuration is built once at startup: defaults, then an optional TOML
//! file, then environment overrides. The result is immutable and handed to
//! the driver by value.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for stmesh.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Orchestrator configuration.
    #[serde(default)]
    pub docker: DockerConfig,
    /// Peer application configuration.
    #[serde(default)]
    pub syncthing: SyncthingConfig,
    /// Convergence cycle configuration.
    #[serde(default)]
    pub cycle: CycleConfig,
    /// HTTP endpoints configuration.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    /// Docker Engine endpoint, `unix://` socket or `tcp://`/`http(s)://` URL
    /// (default: unix:///var/run/docker.sock).
    #[serde(default = "default_docker_endpoint")]
    pub endpoint: String,
    /// Engine API version (default: 1.47).
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Swarm service whose running tasks form the fleet (default: syncthing_server).
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

/// Peer application configuration.
#[derive(Clone, Deserialize)]
pub struct SyncthingConfig {
    /// GUI/REST port on every peer (default: 8384).
    #[serde(default = "default_syncthing_port")]
    pub port: u16,
    /// REST API key shared by every peer (default: empty).
    #[serde(default)]
    pub api_key: String,
    /// Folder ID to share across the fleet (default: "default").
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Per-request timeout in seconds, applied to Docker calls too (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for SyncthingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncthingConfig")
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("folder", &self.folder)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Convergence cycle configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CycleConfig {
    /// Delay between the end of one cycle and the start of the next (default: 60).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

/// HTTP endpoints configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Serve /health and /metrics (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// Bind address for the HTTP server (default: 0.0.0.0:8080).
    #[serde(default = "default_http_bind")]
    pub bind_address: String,
}

// Default value functions
fn default_docker_endpoint() -> String {
    mesh_client::DEFAULT_DOCKER_ENDPOINT.to_string()
}

fn default_api_version() -> String {
    "1.47".to_string()
}

fn default_service_name() -> String {
    "syncthing_server".to_string()
}

fn default_syncthing_port() -> u16 {
    8384
}

fn default_folder() -> String {
    "default".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    60
}

fn default_http_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_docker_endpoint(),
            api_version: default_api_version(),
            service_name: default_service_name(),
        }
    }
}

impl Default for SyncthingConfig {
    fn default() -> Self {
        Self {
            port: default_syncthing_port(),
            api_key: String::new(),
            folder: default_folder(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: default_http_bind(),
        }
    }
}

/// Environment variables understood by [`Config::with_env`].
pub mod env {
    /// Syncthing REST API key.
    pub const API_KEY: &str = "STGUIAPIKEY";
    /// Seconds between cycles.
    pub const SLEEP_SECONDS: &str = "SLEEP_SECONDS";
    /// Syncthing REST port.
    pub const SYNCTHING_PORT: &str = "SYNCTHING_PORT";
    /// Swarm service name.
    pub const SERVICE_NAME: &str = "ST_SRV_NAME";
    /// Folder ID to share.
    pub const FOLDER: &str = "ST_FOLDER";
    /// Docker Engine API base URL.
    pub const DOCKER_ENDPOINT: &str = "DOCKER_ENDPOINT";
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Unset variables leave the current value in place.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(env::API_KEY) {
            self.syncthing.api_key = key;
        }
        if let Some(raw) = lookup(env::SLEEP_SECONDS) {
            self.cycle.interval_secs = parse_env(env::SLEEP_SECONDS, &raw)?;
        }
        if let Some(raw) = lookup(env::SYNCTHING_PORT) {
            self.syncthing.port = parse_env(env::SYNCTHING_PORT, &raw)?;
        }
        if let Some(name) = lookup(env::SERVICE_NAME) {
            self.docker.service_name = name;
        }
        if let Some(folder) = lookup(env::FOLDER) {
            self.syncthing.folder = folder;
        }
        if let Some(endpoint) = lookup(env::DOCKER_ENDPOINT) {
            self.docker.endpoint = endpoint;
        }
        Ok(self)
    }

    /// Apply overrides from the process environment.
    pub fn with_process_env(self) -> Result<Self, ConfigError> {
        self.with_env(|name| std::env::var(name).ok())
    }

    /// Delay between cycles.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.cycle.interval_secs)
    }

    /// Per-request timeout for both HTTP clients.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.syncthing.request_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: raw.to_string(),
    })
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Environment variable holds an unusable value.
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}
