//! Error types for the Bookflow API client

use thiserror::Error;

/// Errors that can occur when talking to the booking backend
///
/// Cloneable so reducers can carry failures inside actions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The resource does not exist (HTTP 404), or a lookup came back empty
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the payload (HTTP 400)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Missing or expired credentials (HTTP 401 after a refresh attempt)
    #[error("Unauthorized - session expired or missing")]
    Unauthorized,

    /// Any other non-success status
    #[error("API error (status {status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    Request(String),

    /// Response body could not be decoded
    #[error("Response decoding failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether this error means the session is no longer usable
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Errors raised while building the client from configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `BOOKFLOW_API_URL` is not an http(s) URL
    #[error("Invalid API URL '{0}': expected http:// or https://")]
    InvalidUrl(String),

    /// `BOOKFLOW_API_TIMEOUT_SECS` is not a positive integer
    #[error("Invalid request timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),

    /// The underlying HTTP client could not be constructed
    #[error("HTTP client construction failed: {0}")]
    HttpClient(String),
}
