//! Client configuration
//!
//! Loaded from environment variables (after an optional `.env` file):
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BOOKFLOW_API_URL` | `http://localhost:8000/api` |
//! | `BOOKFLOW_API_TIMEOUT_SECS` | `30` |
//! | `BOOKFLOW_ACCESS_TOKEN` | unset |
//! | `BOOKFLOW_REFRESH_TOKEN` | unset |

use crate::error::ConfigError;
use std::time::Duration;

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// API client configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL all endpoint paths are appended to
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Initial bearer token
    pub access_token: Option<String>,
    /// Token used to obtain a new access token on 401
    pub refresh_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            access_token: None,
            refresh_token: None,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with default timeout and no tokens
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the initial access and refresh tokens
    #[must_use]
    pub fn with_tokens(mut self, access: Option<String>, refresh: Option<String>) -> Self {
        self.access_token = access;
        self.refresh_token = refresh;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the URL or the timeout is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the URL or the timeout is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("BOOKFLOW_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(base_url));
        }

        let timeout = match lookup("BOOKFLOW_API_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let non_empty = |value: String| (!value.trim().is_empty()).then_some(value);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            access_token: lookup("BOOKFLOW_ACCESS_TOKEN").and_then(non_empty),
            refresh_token: lookup("BOOKFLOW_REFRESH_TOKEN").and_then(non_empty),
        })
    }
}
