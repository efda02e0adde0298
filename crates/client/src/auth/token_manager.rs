//! Access token lifecycle
//!
//! Manages the bearer token used by [`crate::ApiClient`]:
//! - In-memory token, reused until invalidated
//! - Optional external cache, consulted before the token endpoint
//! - Client-credentials exchange against `oauth/token`
//!
//! Expiry is not tracked. A stale token is discovered when the API answers
//! with a `Bearer` challenge, at which point the caller invalidates it.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, info, warn};

use super::cache::{TokenCache, ACCESS_TOKEN_KEY};
use super::challenge::is_invalid_client;
use super::types::{Credentials, TokenResponse};
use crate::errors::ApiError;
use crate::http::{RequestParams, Transport, TransportRequest, TransportResponse};

/// Token endpoint, relative to the base URI
pub const TOKEN_PATH: &str = "oauth/token";

/// Grant type sent to the token endpoint
pub const GRANT_TYPE: &str = "client_credentials";

/// Owns the current access token
pub struct TokenManager {
    credentials: Credentials,
    token: Option<String>,
    cache: Option<Arc<dyn TokenCache>>,
}

impl TokenManager {
    /// Create a token manager with no token yet
    #[must_use]
    pub fn new(credentials: Credentials, cache: Option<Arc<dyn TokenCache>>) -> Self {
        Self { credentials, token: None, cache }
    }

    /// In-memory token, without consulting the cache or the network
    #[must_use]
    pub fn current_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Return a usable access token.
    ///
    /// Lookup order: memory, then the external cache, then a
    /// client-credentials exchange through `transport`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidCredentials`] if the token endpoint rejects the
    ///   client ID/secret
    /// - [`ApiError::Status`] for any other error response
    /// - [`ApiError::BadJson`] if the success body is not a token response
    /// - [`ApiError::EmptyAccessToken`] if the returned token is empty
    /// - transport failures mapped through [`ApiError::from`]
    pub async fn get_token(&mut self, transport: &dyn Transport) -> Result<String, ApiError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        if let Some(cache) = &self.cache {
            if let Some(token) = cache.get(ACCESS_TOKEN_KEY).await.filter(|t| !t.is_empty()) {
                debug!(token_len = token.len(), "using access token from cache");
                self.token = Some(token.clone());
                return Ok(token);
            }
        }

        let token = self.exchange(transport).await?;
        self.set_token(token.clone()).await;
        Ok(token)
    }

    /// Replace the token in memory and in the cache
    pub async fn set_token(&mut self, token: String) {
        if let Some(cache) = &self.cache {
            cache.set(ACCESS_TOKEN_KEY, &token).await;
        }
        self.token = Some(token);
    }

    /// Drop the token so the next [`get_token`](Self::get_token) fetches a
    /// fresh one. The cache entry is overwritten with an empty value.
    pub async fn invalidate(&mut self) {
        debug!("invalidating access token");
        self.token = None;
        if let Some(cache) = &self.cache {
            cache.set(ACCESS_TOKEN_KEY, "").await;
        }
    }

    async fn exchange(&self, transport: &dyn Transport) -> Result<String, ApiError> {
        let request = TransportRequest::new(Method::POST, TOKEN_PATH)
            .with_params(RequestParams::form([("grant_type", GRANT_TYPE)]))
            .with_basic_auth(self.credentials.basic_auth());

        info!(base_uri = transport.base_uri(), "requesting access token");
        let response = transport.send(&request).await?;

        if response.status.is_success() {
            return parse_token(&response);
        }

        if is_invalid_client(&response) {
            warn!(base_uri = transport.base_uri(), status = %response.status, "client credentials rejected");
            return Err(ApiError::InvalidCredentials { base_uri: transport.base_uri().to_string() });
        }

        warn!(status = %response.status, url = %response.url, "token request failed");
        Err(ApiError::from_response(&response))
    }
}

fn parse_token(response: &TransportResponse) -> Result<String, ApiError> {
    let parsed: TokenResponse = serde_json::from_str(&response.body)
        .map_err(|err| ApiError::bad_json(&err, &response.body))?;

    if parsed.access_token.is_empty() {
        return Err(ApiError::EmptyAccessToken);
    }

    debug!(token_len = parsed.access_token.len(), "received access token");
    Ok(parsed.access_token)
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("has_token", &self.token.is_some())
            .field("has_cache", &self.cache.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::auth::InMemoryTokenCache;
    use crate::http::{MockResponse, MockTransport, RecordingTransport};

    fn credentials() -> Credentials {
        Credentials::new("myid", "mysecret").unwrap()
    }

    fn recording(responses: Vec<MockResponse>) -> RecordingTransport {
        RecordingTransport::recording(Arc::new(MockTransport::new(
            "http://example.com/v1",
            responses,
        )))
    }

    #[tokio::test]
    async fn exchanges_credentials_once() {
        let transport = recording(vec![MockResponse::json(200, &json!({ "access_token": "abcdefg" }))]);
        let mut manager = TokenManager::new(credentials(), None);

        assert_eq!(manager.get_token(&transport).await.unwrap(), "abcdefg");
        assert_eq!(manager.get_token(&transport).await.unwrap(), "abcdefg");
        assert_eq!(manager.current_token(), Some("abcdefg"));

        let log = transport.transactions();
        assert_eq!(log.len(), 1);
        let request = &log[0].request;
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, TOKEN_PATH);
        assert_eq!(request.params, RequestParams::form([("grant_type", "client_credentials")]));
        let auth = request.basic_auth.as_ref().unwrap();
        assert_eq!(auth.username, "myid");
        assert_eq!(auth.password, "mysecret");
    }

    #[tokio::test]
    async fn cached_token_skips_network() {
        let transport = recording(vec![]);
        let cache = Arc::new(InMemoryTokenCache::with_token("v83yb45voqc"));
        let mut manager = TokenManager::new(credentials(), Some(cache));

        assert_eq!(manager.get_token(&transport).await.unwrap(), "v83yb45voqc");
        assert!(transport.is_empty());
    }

    #[tokio::test]
    async fn empty_cached_value_counts_as_absent() {
        let transport = recording(vec![MockResponse::json(200, &json!({ "access_token": "fresh" }))]);
        let cache = Arc::new(InMemoryTokenCache::with_token(""));
        let mut manager = TokenManager::new(credentials(), Some(cache.clone()));

        assert_eq!(manager.get_token(&transport).await.unwrap(), "fresh");
        assert_eq!(cache.peek(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
        assert_eq!(transport.len(), 1);
    }

    #[tokio::test]
    async fn invalidate_clears_memory_and_cache() {
        let cache = Arc::new(InMemoryTokenCache::new());
        let mut manager = TokenManager::new(credentials(), Some(cache.clone()));

        manager.set_token("abc".into()).await;
        assert_eq!(cache.peek(ACCESS_TOKEN_KEY).as_deref(), Some("abc"));

        manager.invalidate().await;
        assert_eq!(manager.current_token(), None);
        assert_eq!(cache.peek(ACCESS_TOKEN_KEY).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn invalid_client_with_basic_challenge() {
        let transport = recording(vec![MockResponse::json(401, &json!({ "error": "invalid_client" }))
            .with_header("WWW-Authenticate", r#"Basic realm="Yak""#)]);
        let mut manager = TokenManager::new(credentials(), None);

        let err = manager.get_token(&transport).await.unwrap_err();
        assert!(
            matches!(err, ApiError::InvalidCredentials { ref base_uri } if base_uri == "http://example.com/v1")
        );
        assert_eq!(manager.current_token(), None);
    }

    #[tokio::test]
    async fn other_token_errors_propagate_as_status() {
        let transport = recording(vec![MockResponse::json(400, &json!({ "error": "invalid_grant" }))
            .with_header("WWW-Authenticate", r#"Basic realm="Yak""#)]);
        let mut manager = TokenManager::new(credentials(), None);

        let err = manager.get_token(&transport).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn non_json_token_body_is_bad_json() {
        let transport = recording(vec![MockResponse::new(200).with_body("<html></html>")]);
        let mut manager = TokenManager::new(credentials(), None);

        let err = manager.get_token(&transport).await.unwrap_err();
        assert!(matches!(err, ApiError::BadJson { ref body, .. } if body == "<html></html>"));
    }

    #[tokio::test]
    async fn missing_access_token_field_is_bad_json() {
        let transport = recording(vec![MockResponse::json(200, &json!({ "token_type": "bearer" }))]);
        let mut manager = TokenManager::new(credentials(), None);

        let err = manager.get_token(&transport).await.unwrap_err();
        assert!(matches!(err, ApiError::BadJson { .. }));
    }

    #[tokio::test]
    async fn empty_access_token_is_rejected() {
        let transport = recording(vec![MockResponse::json(200, &json!({ "access_token": "" }))]);
        let mut manager = TokenManager::new(credentials(), None);

        let err = manager.get_token(&transport).await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyAccessToken));
    }

    #[test]
    fn debug_hides_token_and_secret() {
        let manager = TokenManager {
            credentials: credentials(),
            token: Some("supersecrettoken".into()),
            cache: None,
        };
        let printed = format!("{manager:?}");
        assert!(!printed.contains("supersecrettoken"));
        assert!(!printed.contains("mysecret"));
    }
}
