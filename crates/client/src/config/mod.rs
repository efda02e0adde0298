//! Client configuration
//!
//! [`ClientConfig`] describes the transport (base URI, timeout, extra
//! headers). [`Settings`] adds the credentials and is what the
//! [`loader`] produces from the environment or a file.

pub mod loader;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use crate::auth::Credentials;
use crate::errors::ApiError;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

/// Production API root
pub const DEFAULT_BASE_URI: &str = "https://api.symplur.com/v1";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Transport settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root; a trailing `/` is ignored
    pub base_uri: String,

    /// Per-request timeout in seconds; `0` means [`DEFAULT_TIMEOUT_SECS`]
    pub timeout_secs: u64,

    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Default settings pointed at another API root
    #[must_use]
    pub fn with_base_uri(base_uri: impl Into<String>) -> Self {
        Self { base_uri: base_uri.into(), ..Self::default() }
    }

    /// Timeout as a [`Duration`]. An unset (`0`) timeout falls back to the
    /// default.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }

    /// Base URI without the trailing `/`
    #[must_use]
    pub fn normalized_base_uri(&self) -> &str {
        self.base_uri.trim_end_matches('/')
    }

    /// Extra headers as a [`HeaderMap`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] for a name or value that is not a valid
    /// HTTP header.
    pub fn header_map(&self) -> Result<HeaderMap, ApiError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::Config(format!("Invalid header name: {name}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::Config(format!("Invalid value for header {name}")))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

/// Credentials plus transport settings, as loaded from the environment or a
/// file
#[derive(Clone, Deserialize)]
pub struct Settings {
    /// OAuth client ID
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Transport settings
    #[serde(flatten)]
    pub client: ClientConfig,
}

impl Settings {
    /// Validated credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if either value is empty.
    pub fn credentials(&self) -> Result<Credentials, ApiError> {
        Credentials::new(self.client_id.clone(), self.client_secret.clone())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("client", &self.client)
            .finish()
    }
}
