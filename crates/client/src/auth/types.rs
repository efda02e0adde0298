//! OAuth 2.0 client-credentials types

use std::fmt;

use serde::Deserialize;

use crate::errors::ApiError;
use crate::http::BasicAuth;

/// Client ID and secret used for the client-credentials grant
///
/// Both halves are required. The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    /// Validate and wrap a client ID/secret pair.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if either value is empty.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self, ApiError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.is_empty() {
            return Err(ApiError::Config("Client ID is empty".to_string()));
        }
        if client_secret.is_empty() {
            return Err(ApiError::Config("Client Secret is empty".to_string()));
        }

        Ok(Self { client_id, client_secret })
    }

    /// The client ID
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The client secret
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub(crate) fn basic_auth(&self) -> BasicAuth {
        BasicAuth { username: self.client_id.clone(), password: self.client_secret.clone() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Successful token endpoint response; other fields are ignored
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for subsequent requests
    pub access_token: String,
}

/// RFC 6749 §5.2 error response body
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorBody {
    /// Error code, e.g. `invalid_client`
    pub error: String,

    /// Optional human-readable description
    #[serde(default)]
    pub error_description: Option<String>,
}
