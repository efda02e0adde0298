//! Transport abstraction
//!
//! A [`Transport`] sends one fully described request and hands back the raw
//! response, whatever its status. Interpreting statuses and challenges is the
//! caller's job.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Errors raised before a response exists
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No response within the configured timeout
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Absolute URL of the request
        url: String,
        /// Configured timeout
        timeout: Duration,
    },

    /// Connection refused, reset, DNS failure and similar
    #[error("network error for {url}: {message}")]
    Network {
        /// Absolute URL of the request
        url: String,
        /// Underlying error text
        message: String,
    },

    /// The request could not be built (bad URL, bad header)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A mock transport ran out of canned responses
    #[error("no mock response left for {method} {path}")]
    MockExhausted {
        /// Request method
        method: String,
        /// Relative request path
        path: String,
    },
}

/// Parameters sent with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestParams {
    /// Appended to the URL as a query string
    Query(Vec<(String, String)>),
    /// Sent as an `application/x-www-form-urlencoded` body
    Form(Vec<(String, String)>),
}

impl RequestParams {
    /// Query-string parameters
    pub fn query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Query(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Form-body parameters
    pub fn form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// The key/value pairs regardless of placement
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        match self {
            Self::Query(pairs) | Self::Form(pairs) => pairs,
        }
    }
}

impl Default for RequestParams {
    fn default() -> Self {
        Self::Query(Vec::new())
    }
}

/// HTTP Basic credentials attached to a request
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// User name (the OAuth client ID)
    pub username: String,
    /// Password (the OAuth client secret)
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One request as handed to a [`Transport`]
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the transport's base URI, without a leading `/`
    pub path: String,
    /// Query or form parameters
    pub params: RequestParams,
    /// Per-request headers
    pub headers: HeaderMap,
    /// Basic credentials, used only for the token exchange
    pub basic_auth: Option<BasicAuth>,
}

impl TransportRequest {
    /// New request with no parameters and no headers.
    ///
    /// Leading slashes are stripped from `path` so it always resolves
    /// relative to the base URI.
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.trim_start_matches('/').to_string(),
            params: RequestParams::default(),
            headers: HeaderMap::new(),
            basic_auth: None,
        }
    }

    /// Replace the request parameters
    #[must_use]
    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    /// Set a header, replacing any previous value
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set `Authorization: Bearer <token>`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidRequest`] if the token contains
    /// characters that are not allowed in a header value.
    pub fn with_bearer_token(self, token: &str) -> Result<Self, TransportError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            TransportError::InvalidRequest("access token is not a valid header value".into())
        })?;
        value.set_sensitive(true);
        Ok(self.with_header(AUTHORIZATION, value))
    }

    /// Attach Basic credentials
    #[must_use]
    pub fn with_basic_auth(mut self, auth: BasicAuth) -> Self {
        self.basic_auth = Some(auth);
        self
    }

    /// First value of a header as text
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Raw response returned by a [`Transport`]
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Response status
    pub status: StatusCode,
    /// Absolute URL the request was sent to
    pub url: String,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    /// First value of a header as text
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Every textual value of a header, in the order received
    pub fn header_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers.get_all(name).iter().filter_map(|value| value.to_str().ok())
    }
}

/// Sends requests relative to a base URI.
///
/// Implementations must return `Ok` for every HTTP status; `Err` is reserved
/// for failures where no response exists.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Base URI requests are resolved against, without a trailing `/`
    fn base_uri(&self) -> &str;

    /// Send one request
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Join a base URI and a relative path the way every transport here does.
#[must_use]
pub fn join_url(base_uri: &str, path: &str) -> String {
    format!("{}/{}", base_uri.trim_end_matches('/'), path.trim_start_matches('/'))
}
