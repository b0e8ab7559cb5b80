//! Docker Engine API membership provider.
//!
//! Lists swarm tasks through `GET /v{version}/tasks` with a JSON `filters`
//! parameter. Must talk to a manager node: workers cannot list tasks.
//!
//! The Engine is reached either on its local socket (`unix:///var/run/docker.sock`,
//! the default) or over TCP (`tcp://host:2375`, `http://…`, `https://…`),
//! for example through a socket proxy.

use super::{MembershipError, MembershipProvider};
use crate::BuildError;
use async_trait::async_trait;
use hyper::body::Bytes;
use mesh_types::{DockerTask, PeerAddress, TaskFilters};
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

/// Default Engine endpoint: the local daemon socket.
pub const DEFAULT_DOCKER_ENDPOINT: &str = "unix:///var/run/docker.sock";

/// Docker Engine API client configuration.
#[derive(Debug, Clone)]
pub struct DockerApiConfig {
    /// Engine endpoint, `unix:///path` or an HTTP(S)/TCP URL.
    pub endpoint: String,
    /// API version used in the path (without the leading `v`).
    pub api_version: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for DockerApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DOCKER_ENDPOINT.into(),
            api_version: "1.47".into(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Where the Engine API lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerEndpoint {
    /// Local socket path.
    Unix(PathBuf),
    /// HTTP(S) base URL.
    Http(Url),
}

impl DockerEndpoint {
    /// Parse an endpoint string. `tcp://` is treated as plain HTTP, as the
    /// Docker CLI does.
    pub fn parse(endpoint: &str) -> Result<Self, BuildError> {
        let invalid = |reason: &str| BuildError::Endpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        if let Some(path) = endpoint.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid("missing socket path"));
            }
            return Ok(DockerEndpoint::Unix(PathBuf::from(path)));
        }

        let http = match endpoint.strip_prefix("tcp://") {
            Some(rest) => format!("http://{}", rest),
            None => endpoint.to_string(),
        };
        let url = Url::parse(&http).map_err(|e| invalid(&e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(DockerEndpoint::Http(url)),
            _ => Err(invalid("unknown scheme")),
        }
    }
}

#[derive(Debug, Clone)]
enum Transport {
    Http(reqwest::Client),
    #[cfg(unix)]
    Unix(PathBuf),
}

/// Membership provider backed by the Docker Engine task API.
#[derive(Debug, Clone)]
pub struct DockerMembership {
    config: DockerApiConfig,
    base: Url,
    transport: Transport,
}

impl DockerMembership {
    /// Create a new client. Nothing is contacted until the first query.
    pub fn new(config: DockerApiConfig) -> Result<Self, BuildError> {
        let (base, transport) = match DockerEndpoint::parse(&config.endpoint)? {
            DockerEndpoint::Http(url) => {
                let http = reqwest::Client::builder()
                    .timeout(config.request_timeout)
                    .build()?;
                (url, Transport::Http(http))
            }
            #[cfg(unix)]
            DockerEndpoint::Unix(path) => {
                // The host is only used for the Host header.
                let base = Url::parse("http://docker").map_err(|e| BuildError::Endpoint {
                    endpoint: config.endpoint.clone(),
                    reason: e.to_string(),
                })?;
                (base, Transport::Unix(path))
            }
            #[cfg(not(unix))]
            DockerEndpoint::Unix(_) => {
                return Err(BuildError::Endpoint {
                    endpoint: config.endpoint.clone(),
                    reason: "unix sockets are not supported on this platform".into(),
                })
            }
        };

        Ok(Self {
            config,
            base,
            transport,
        })
    }

    /// URL of the task listing endpoint, without filters.
    pub fn tasks_url(&self) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&format!("v{}", self.config.api_version))
                .push("tasks");
        }
        url
    }

    async fn get(&self, url: Url) -> Result<(u16, Bytes), MembershipError> {
        match &self.transport {
            Transport::Http(http) => {
                let response = http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| MembershipError::Unavailable(e.to_string()))?;
                let status = response.status().as_u16();
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| MembershipError::Unavailable(e.to_string()))?;
                Ok((status, body))
            }
            #[cfg(unix)]
            Transport::Unix(socket) => {
                tokio::time::timeout(self.config.request_timeout, unix_get(socket, &url))
                    .await
                    .map_err(|_| {
                        MembershipError::Unavailable(format!(
                            "{} timed out after {:?}",
                            socket.display(),
                            self.config.request_timeout
                        ))
                    })?
            }
        }
    }
}

#[cfg(unix)]
fn socket_error(socket: &std::path::Path, e: impl std::fmt::Display) -> MembershipError {
    MembershipError::Unavailable(format!("{}: {}", socket.display(), e))
}

/// One HTTP/1.1 GET over a fresh connection to the Engine socket.
#[cfg(unix)]
async fn unix_get(socket: &std::path::Path, url: &Url) -> Result<(u16, Bytes), MembershipError> {
    use http_body_util::{BodyExt, Empty};
    use hyper_util::rt::TokioIo;

    let stream = tokio::net::UnixStream::connect(socket)
        .await
        .map_err(|e| socket_error(socket, e))?;
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| socket_error(socket, e))?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(error = %e, "docker socket connection closed");
        }
    });

    let target = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    let request = hyper::Request::get(target)
        .header(hyper::header::HOST, url.host_str().unwrap_or("docker"))
        .body(Empty::<Bytes>::new())
        .map_err(|e| socket_error(socket, e))?;

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| socket_error(socket, e))?;
    let status = response.status().as_u16();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| socket_error(socket, e))?
        .to_bytes();
    Ok((status, body))
}

#[async_trait]
impl MembershipProvider for DockerMembership {
    async fn running_task_addresses(
        &self,
        service: &str,
    ) -> Result<Vec<PeerAddress>, MembershipError> {
        let filters = serde_json::to_string(&TaskFilters::running(service))
            .map_err(|e| MembershipError::Malformed(e.to_string()))?;

        let mut url = self.tasks_url();
        url.query_pairs_mut().append_pair("filters", &filters);

        let (status, body) = self.get(url).await?;
        if !(200..300).contains(&status) {
            return Err(MembershipError::Unavailable(format!(
                "{} returned {}: {}",
                self.tasks_url(),
                status,
                String::from_utf8_lossy(&body).trim()
            )));
        }

        let tasks: Vec<DockerTask> = serde_json::from_slice(&body)
            .map_err(|e| MembershipError::Malformed(e.to_string()))?;

        tracing::debug!(service, tasks = tasks.len(), "listed running tasks");

        Ok(tasks.iter().flat_map(DockerTask::addresses).collect())
    }
}
