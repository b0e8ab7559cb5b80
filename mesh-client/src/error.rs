//! Client construction errors.

use thiserror::Error;

/// A client could not be built from its configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The underlying HTTP client could not be built (TLS backend, bad settings).
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint is not a `unix://`, `tcp://`, `http://` or `https://` URL.
    #[error("unsupported endpoint {endpoint:?}: {reason}")]
    Endpoint {
        /// The endpoint as configured.
        endpoint: String,
        /// What is wrong with it.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_error_names_the_endpoint() {
        let err = BuildError::Endpoint {
            endpoint: "ftp://docker".into(),
            reason: "unknown scheme".into(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported endpoint \"ftp://docker\": unknown scheme"
        );
    }
}
