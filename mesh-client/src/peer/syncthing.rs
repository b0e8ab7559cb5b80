//! Syncthing REST API client.
//!
//! Every request carries the `X-API-Key` header. The same key is expected
//! to be valid on every peer of the service.

use super::{PeerApi, PeerError};
use crate::BuildError;
use async_trait::async_trait;
use mesh_types::{
    DeviceConfig, DeviceId, FolderConfig, FolderDevicesPatch, NewDevice, PeerAddress, SystemStatus,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Header carrying the GUI/REST API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Syncthing REST client configuration.
#[derive(Clone)]
pub struct SyncthingApiConfig {
    /// GUI/REST port, identical on every peer.
    pub port: u16,
    /// API key sent with every request.
    pub api_key: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for SyncthingApiConfig {
    fn default() -> Self {
        Self {
            port: 8384,
            api_key: String::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for SyncthingApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncthingApiConfig")
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Client for the Syncthing REST API of any peer in the fleet.
#[derive(Debug, Clone)]
pub struct SyncthingClient {
    config: SyncthingApiConfig,
    http: reqwest::Client,
}

impl SyncthingClient {
    /// Create a new client.
    pub fn new(config: SyncthingApiConfig) -> Result<Self, BuildError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    /// Base URL of a peer's REST API.
    pub fn base_url(&self, address: &PeerAddress) -> String {
        let host = address.as_str();
        if host.contains(':') && !host.starts_with('[') {
            format!("http://[{}]:{}", host, self.config.port)
        } else {
            format!("http://{}:{}", host, self.config.port)
        }
    }

    /// URL of `segments` under the peer's base URL. Each segment is
    /// percent-encoded, so a folder ID cannot escape its path segment.
    fn url(&self, address: &PeerAddress, segments: &[&str]) -> Result<Url, PeerError> {
        let invalid = |reason: String| PeerError::Unreachable {
            address: address.clone(),
            reason,
        };
        let mut url = Url::parse(&self.base_url(address))
            .map_err(|e| invalid(format!("invalid peer url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid("peer url cannot take a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of the status endpoint.
    pub fn status_url(&self, address: &PeerAddress) -> Result<Url, PeerError> {
        self.url(address, &["rest", "system", "status"])
    }

    /// URL of the device directory.
    pub fn devices_url(&self, address: &PeerAddress) -> Result<Url, PeerError> {
        self.url(address, &["rest", "config", "devices"])
    }

    /// URL of one folder's configuration.
    pub fn folder_url(&self, address: &PeerAddress, folder: &str) -> Result<Url, PeerError> {
        self.url(address, &["rest", "config", "folders", folder])
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        address: &PeerAddress,
        url: Url,
    ) -> Result<T, PeerError> {
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| unreachable(address, e))?;

        let response = check_status(address, response).await?;

        response.json().await.map_err(|e| PeerError::Malformed {
            address: address.clone(),
            reason: e.to_string(),
        })
    }

    async fn send(&self, address: &PeerAddress, request: reqwest::RequestBuilder) -> Result<(), PeerError> {
        let response = request
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| unreachable(address, e))?;

        check_status(address, response).await.map(|_| ())
    }
}

fn unreachable(address: &PeerAddress, e: reqwest::Error) -> PeerError {
    PeerError::Unreachable {
        address: address.clone(),
        reason: e.to_string(),
    }
}

async fn check_status(
    address: &PeerAddress,
    response: reqwest::Response,
) -> Result<reqwest::Response, PeerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(PeerError::Rejected {
        address: address.clone(),
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

#[async_trait]
impl PeerApi for SyncthingClient {
    async fn status(&self, address: &PeerAddress) -> Result<SystemStatus, PeerError> {
        self.get_json(address, self.status_url(address)?).await
    }

    async fn devices(&self, address: &PeerAddress) -> Result<Vec<DeviceId>, PeerError> {
        let devices: Vec<DeviceConfig> = self.get_json(address, self.devices_url(address)?).await?;
        Ok(devices.into_iter().map(|d| d.device_id).collect())
    }

    async fn add_device(&self, address: &PeerAddress, device: &NewDevice) -> Result<(), PeerError> {
        let request = self.http.post(self.devices_url(address)?).json(device);
        self.send(address, request).await
    }

    async fn folder(
        &self,
        address: &PeerAddress,
        folder: &str,
    ) -> Result<FolderConfig, PeerError> {
        self.get_json(address, self.folder_url(address, folder)?).await
    }

    async fn set_folder_devices(
        &self,
        address: &PeerAddress,
        folder: &str,
        devices: &[DeviceId],
    ) -> Result<(), PeerError> {
        let request = self
            .http
            .patch(self.folder_url(address, folder)?)
            .json(&FolderDevicesPatch::from_ids(devices));
        self.send(address, request).await
    }
}
