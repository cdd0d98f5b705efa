//! Client configuration.
//!
//! The base URL is resolved once at startup from `PARKSPOT_API_BASE`,
//! falling back to a local development server.

use std::time::Duration;

/// Application name used for data directory paths and the keychain service
pub const APP_NAME: &str = "parkspot";

/// Environment variable overriding the API base URL
pub const API_BASE_ENV: &str = "PARKSPOT_API_BASE";

/// Base URL used when no override is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Request timeout. `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Use `base_url` if it is present and non-empty, else the default.
    /// A non-empty value is kept exactly as given.
    pub fn resolve(base_url: Option<&str>) -> Self {
        let base_url = match base_url {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => DEFAULT_BASE_URL.to_string(),
        };
        Self {
            base_url,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Join a request path onto the base URL.
    /// Absolute `http(s)://` URLs are returned unchanged.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let path = path.trim_start_matches('/');
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::resolve(None)
    }
}
