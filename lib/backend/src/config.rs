//! Backend service configuration.

use serde::Deserialize;

/// Location and credentials for the hosted backend service.
///
/// Both `url` and `publishable_key` are required; the application treats
/// their absence as a fatal startup condition rather than a per-request
/// error.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend project, e.g. `https://abc.example.co`.
    pub url: String,
    /// Publishable API key sent with every request.
    pub publishable_key: String,
    /// Per-request timeout for calls to the backend, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout_seconds() -> u64 {
    10
}

impl BackendConfig {
    /// Creates a config with the default timeout.
    #[must_use]
    pub fn new(url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            publishable_key: publishable_key.into(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}
