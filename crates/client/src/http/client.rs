//! HTTP transport
//!
//! [`ReqwestTransport`] sends [`TransportRequest`]s over `reqwest` with a fixed
//! timeout, the SDK `User-Agent` and optional default headers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client as ReqwestClient;
use tracing::debug;

use super::transport::{
    join_url, RequestParams, Transport, TransportError, TransportRequest, TransportResponse,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Prefix of the `User-Agent` header sent with every request.
pub const USER_AGENT_BASE: &str = "SymplurApiSdk/1.0";

/// Production transport backed by `reqwest`.
///
/// Sends each request exactly once. Network failures and timeouts are
/// reported, never retried.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    base_uri: String,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Start building a transport for `base_uri`.
    pub fn builder(base_uri: impl Into<String>) -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new(base_uri)
    }

    /// Configured request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, url: &str, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout { url: url.to_string(), timeout: self.timeout }
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Network { url: url.to_string(), message: err.to_string() }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn base_uri(&self) -> &str {
        &self.base_uri
    }

    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = join_url(&self.base_uri, &request.path);
        let method = request.method.clone();

        let mut builder =
            self.client.request(method.clone(), &url).headers(request.headers.clone());
        builder = match &request.params {
            RequestParams::Query(pairs) if pairs.is_empty() => builder,
            RequestParams::Query(pairs) => builder.query(pairs),
            RequestParams::Form(pairs) => builder.form(pairs),
        };
        if let Some(auth) = &request.basic_auth {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }

        debug!(%method, %url, "sending HTTP request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                return Err(self.map_error(&url, &err));
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        debug!(%method, %url, %status, "received HTTP response");

        let body = response.text().await.map_err(|err| self.map_error(&url, &err))?;

        Ok(TransportResponse { status, url, headers, body })
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    base_uri: String,
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
}

impl ReqwestTransportBuilder {
    fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            default_headers: None,
        }
    }

    /// Per-request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the `User-Agent` header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Headers added to every request
    #[must_use]
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidRequest`] if the base URI is not an
    /// absolute URL or the underlying client cannot be created.
    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let base_uri = self.base_uri.trim_end_matches('/').to_string();
        url::Url::parse(&base_uri).map_err(|err| {
            TransportError::InvalidRequest(format!("invalid base URI '{base_uri}': {err}"))
        })?;

        let agent = self.user_agent.unwrap_or_else(default_user_agent);
        let mut builder = ReqwestClient::builder().timeout(self.timeout).user_agent(agent);

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            TransportError::InvalidRequest(format!("failed to build HTTP client: {err}"))
        })?;

        Ok(ReqwestTransport { client, base_uri, timeout: self.timeout })
    }
}

/// `SymplurApiSdk/1.0 symplur-client/<version>`
#[must_use]
pub fn default_user_agent() -> String {
    format!("{USER_AGENT_BASE} symplur-client/{}", env!("CARGO_PKG_VERSION"))
}
