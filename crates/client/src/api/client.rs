//! Authenticated API client
//!
//! Attaches the current bearer token to every request. When the API rejects
//! the token with a `Bearer` challenge, the token is invalidated and the
//! request is sent exactly once more with a fresh one.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::response::{classify, Attempt, AttemptOutcome};
use crate::auth::{Credentials, TokenCache, TokenManager};
use crate::config::{ClientConfig, Settings};
use crate::errors::ApiError;
use crate::http::{
    MockResponse, MockTransport, RecordingTransport, ReqwestTransport, RequestParams, Transaction,
    Transport, TransportRequest,
};

const PREFER: &str = "prefer";
const PREFER_MINIMAL: &str = "representation=minimal";

/// Symplur API client
///
/// Every method that may touch the token takes `&mut self`: one client
/// instance serves one caller at a time.
pub struct ApiClient {
    tokens: TokenManager,
    transport: RecordingTransport,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a client that talks to `config.base_uri` over HTTP
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URI or a configured header is
    /// invalid.
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, ApiError> {
        Self::builder().credentials(credentials).config(config).build()
    }

    /// Create a client from loaded [`Settings`]
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] for empty credentials or an invalid
    /// transport configuration.
    pub fn from_settings(settings: Settings) -> Result<Self, ApiError> {
        let credentials = settings.credentials()?;
        Self::new(credentials, settings.client)
    }

    /// Create a builder for fluent configuration
    #[must_use]
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Transport settings this client was built with
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// API root requests resolve against
    #[must_use]
    pub fn base_uri(&self) -> &str {
        self.transport.base_uri()
    }

    /// `GET` with query-string parameters
    ///
    /// # Errors
    ///
    /// See [`request_json`](Self::request_json).
    pub async fn get<T: DeserializeOwned>(
        &mut self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        self.request_json(Method::GET, path, RequestParams::query(query.iter().copied())).await
    }

    /// `POST` with form parameters
    ///
    /// # Errors
    ///
    /// See [`request_json`](Self::request_json).
    pub async fn post<T: DeserializeOwned>(
        &mut self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        self.request_json(Method::POST, path, RequestParams::form(form.iter().copied())).await
    }

    /// `PUT` with form parameters
    ///
    /// # Errors
    ///
    /// See [`request_json`](Self::request_json).
    pub async fn put<T: DeserializeOwned>(
        &mut self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        self.request_json(Method::PUT, path, RequestParams::form(form.iter().copied())).await
    }

    /// `PATCH` with form parameters
    ///
    /// # Errors
    ///
    /// See [`request_json`](Self::request_json).
    pub async fn patch<T: DeserializeOwned>(
        &mut self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        self.request_json(Method::PATCH, path, RequestParams::form(form.iter().copied())).await
    }

    /// `DELETE` with form parameters
    ///
    /// # Errors
    ///
    /// See [`request_json`](Self::request_json).
    pub async fn delete<T: DeserializeOwned>(
        &mut self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        self.request_json(Method::DELETE, path, RequestParams::form(form.iter().copied())).await
    }

    /// Send an authenticated request and decode the JSON response.
    ///
    /// Returns `Ok(None)` for `404 Not Found`. A `Bearer` challenge causes one
    /// token refresh and one resend; a second challenge is returned as
    /// [`ApiError::Status`].
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidCredentials`] when the token endpoint rejects the
    ///   client ID/secret
    /// - [`ApiError::Status`] for any other unsuccessful response
    /// - [`ApiError::BadJson`] when a success body is not valid JSON for `T`
    /// - [`ApiError::Network`] / [`ApiError::Timeout`] from the transport
    #[instrument(skip(self, params), fields(method = %method, path = %path))]
    pub async fn request_json<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        params: RequestParams,
    ) -> Result<Option<T>, ApiError> {
        let request = TransportRequest::new(method, path).with_params(params);

        let outcome = match self.attempt(&request, Attempt::First).await {
            AttemptOutcome::Unauthorized(response) => {
                warn!(status = %response.status, url = %response.url, "access token rejected, re-authenticating");
                self.tokens.invalidate().await;
                self.attempt(&request, Attempt::Retry).await
            }
            outcome => outcome,
        };

        match outcome {
            AttemptOutcome::Success(value) => Ok(Some(value)),
            AttemptOutcome::NotFound => {
                debug!("resource not found");
                Ok(None)
            }
            AttemptOutcome::Unauthorized(response) => Err(ApiError::from_response(&response)),
            AttemptOutcome::Failed(err) => Err(err),
        }
    }

    /// One pass: token, headers, send, classify. Never retries.
    async fn attempt<T: DeserializeOwned>(
        &mut self,
        request: &TransportRequest,
        attempt: Attempt,
    ) -> AttemptOutcome<T> {
        let token = match self.tokens.get_token(&self.transport).await {
            Ok(token) => token,
            Err(err) => return AttemptOutcome::Failed(err),
        };

        let request = match request.clone().with_bearer_token(&token) {
            Ok(request) => request.with_header(
                HeaderName::from_static(PREFER),
                HeaderValue::from_static(PREFER_MINIMAL),
            ),
            Err(err) => return AttemptOutcome::Failed(err.into()),
        };

        debug!(attempt = attempt.as_str(), "sending authenticated request");
        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(attempt = attempt.as_str(), error = %err, "request failed");
                return AttemptOutcome::Failed(err.into());
            }
        };
        debug!(attempt = attempt.as_str(), status = %response.status, "received response");

        match (attempt, classify(response)) {
            (Attempt::Retry, AttemptOutcome::Unauthorized(response)) => {
                warn!("fresh access token rejected");
                AttemptOutcome::Failed(ApiError::from_response(&response))
            }
            (_, outcome) => outcome,
        }
    }

    /// Current access token, fetching one if needed.
    ///
    /// # Errors
    ///
    /// Same as the token exchange in [`request_json`](Self::request_json).
    pub async fn access_token(&mut self) -> Result<String, ApiError> {
        self.tokens.get_token(&self.transport).await
    }

    /// Use `token` for subsequent requests; written through to the cache.
    pub async fn set_access_token(&mut self, token: impl Into<String>) {
        self.tokens.set_token(token.into()).await;
    }

    /// Forget the current token so the next request fetches a fresh one
    pub async fn invalidate_token(&mut self) {
        self.tokens.invalidate().await;
    }

    /// Replace the transport with canned responses, replayed in order.
    ///
    /// Clears the transaction log and starts recording.
    pub fn set_mock_responses(&mut self, responses: Vec<MockResponse>) {
        info!(count = responses.len(), "installing mock responses");
        let mock = MockTransport::new(self.transport.base_uri(), responses);
        self.transport = RecordingTransport::recording(Arc::new(mock));
    }

    /// Every request sent since recording started, oldest first.
    ///
    /// Empty unless recording was enabled through
    /// [`ApiClientBuilder::record_transactions`] or
    /// [`set_mock_responses`](Self::set_mock_responses).
    #[must_use]
    pub fn transaction_log(&self) -> Vec<Transaction> {
        self.transport.transactions()
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("tokens", &self.tokens)
            .field("transport", &self.transport)
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    credentials: Option<Credentials>,
    config: Option<ClientConfig>,
    cache: Option<Arc<dyn TokenCache>>,
    transport: Option<Arc<dyn Transport>>,
    record_transactions: bool,
}

impl ApiClientBuilder {
    /// Set the client ID/secret pair
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the transport configuration
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Mirror the access token in an external cache
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Send through `transport` instead of building an HTTP transport
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Keep a log of every transaction
    #[must_use]
    pub const fn record_transactions(mut self, enabled: bool) -> Self {
        self.record_transactions = enabled;
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if credentials are missing or the HTTP
    /// transport cannot be created.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let credentials = self
            .credentials
            .ok_or_else(|| ApiError::Config("Client credentials not set".to_string()))?;
        let config = self.config.unwrap_or_default();

        let inner: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::builder(config.normalized_base_uri())
                    .timeout(config.timeout())
                    .default_headers(config.header_map()?)
                    .build()?,
            ),
        };

        let transport = if self.record_transactions {
            RecordingTransport::recording(inner)
        } else {
            RecordingTransport::passthrough(inner)
        };

        debug!(base_uri = transport.base_uri(), "API client ready");

        Ok(ApiClient { tokens: TokenManager::new(credentials, self.cache), transport, config })
    }
}
