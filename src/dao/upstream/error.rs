//! Error types for the game server client.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`UpstreamError`] failures.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Failures that can occur while talking to the game server.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build game server client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The game server answered with a non-success status.
    #[error("unexpected game server response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be decoded.
    #[error("failed to decode game server response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    /// True when the game server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            UpstreamError::RequestStatus {
                status: StatusCode::NOT_FOUND,
                ..
            }
        )
    }
}
