//! Canned-response transport
//!
//! Replays a fixed sequence of responses in order, one per request, without
//! touching the network. Used by [`crate::ApiClient::set_mock_responses`] and
//! directly in tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::Serialize;

use super::transport::{join_url, Transport, TransportError, TransportRequest, TransportResponse};

#[derive(Debug, Clone)]
enum MockReply {
    Response { status: u16, headers: Vec<(String, String)>, body: String },
    Failure(TransportFailure),
}

#[derive(Debug, Clone, Copy)]
enum TransportFailure {
    Timeout(Duration),
    Network,
}

/// One canned reply
///
/// # Examples
///
/// ```
/// use symplur_client::http::MockResponse;
///
/// let token = MockResponse::json(200, &serde_json::json!({ "access_token": "abcdefg" }));
/// let rejected = MockResponse::new(401)
///     .with_header("WWW-Authenticate", r#"Bearer realm="Foo", error="invalid_token""#);
/// let html = MockResponse::new(200).with_body("<html><body>Foo!</body></html>");
/// # let _ = (token, rejected, html);
/// ```
#[derive(Debug, Clone)]
pub struct MockResponse {
    reply: MockReply,
}

impl MockResponse {
    /// Empty response with the given status
    #[must_use]
    pub const fn new(status: u16) -> Self {
        Self {
            reply: MockReply::Response { status, headers: Vec::new(), body: String::new() },
        }
    }

    /// Response whose body is `value` serialized as JSON.
    ///
    /// A value that fails to serialize yields an empty body.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap_or_default();
        Self::new(status).with_header("Content-Type", "application/json").with_body(body)
    }

    /// Simulate the transport timing out
    #[must_use]
    pub const fn timeout(after: Duration) -> Self {
        Self { reply: MockReply::Failure(TransportFailure::Timeout(after)) }
    }

    /// Simulate a connection failure
    #[must_use]
    pub const fn network_error() -> Self {
        Self { reply: MockReply::Failure(TransportFailure::Network) }
    }

    /// Add a header; repeated names are kept as separate values
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let MockReply::Response { headers, .. } = &mut self.reply {
            headers.push((name.into(), value.into()));
        }
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        if let MockReply::Response { body: current, .. } = &mut self.reply {
            *current = body.into();
        }
        self
    }

    fn into_result(self, url: String) -> Result<TransportResponse, TransportError> {
        match self.reply {
            MockReply::Response { status, headers, body } => {
                let status = StatusCode::from_u16(status).map_err(|_| {
                    TransportError::InvalidRequest(format!("invalid mock status {status}"))
                })?;
                let mut map = HeaderMap::new();
                for (name, value) in headers {
                    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                        TransportError::InvalidRequest(format!("invalid mock header name {name}"))
                    })?;
                    let value = HeaderValue::from_str(&value).map_err(|_| {
                        TransportError::InvalidRequest(format!("invalid mock header value {value}"))
                    })?;
                    map.append(name, value);
                }
                Ok(TransportResponse { status, url, headers: map, body })
            }
            MockReply::Failure(TransportFailure::Timeout(timeout)) => {
                Err(TransportError::Timeout { url, timeout })
            }
            MockReply::Failure(TransportFailure::Network) => {
                Err(TransportError::Network { url, message: "connection refused (mock)".into() })
            }
        }
    }
}

/// Transport that replays [`MockResponse`]s in order
#[derive(Debug)]
pub struct MockTransport {
    base_uri: String,
    responses: Mutex<VecDeque<MockResponse>>,
}

impl MockTransport {
    /// Mock resolving paths against `base_uri`
    pub fn new(base_uri: impl Into<String>, responses: Vec<MockResponse>) -> Self {
        Self {
            base_uri: base_uri.into().trim_end_matches('/').to_string(),
            responses: Mutex::new(responses.into()),
        }
    }

    /// Responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn base_uri(&self) -> &str {
        &self.base_uri
    }

    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let next = self.responses.lock().pop_front();
        let url = join_url(&self.base_uri, &request.path);

        match next {
            Some(response) => response.into_result(url),
            None => Err(TransportError::MockExhausted {
                method: request.method.to_string(),
                path: request.path.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::*;

    #[tokio::test]
    async fn replays_responses_in_order() {
        let transport = MockTransport::new(
            "http://example.com/",
            vec![
                MockResponse::json(200, &serde_json::json!({ "n": 1 })),
                MockResponse::new(404).with_body("gone"),
            ],
        );

        let first = transport.send(&TransportRequest::new(Method::GET, "a")).await.unwrap();
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.body, r#"{"n":1}"#);
        assert_eq!(first.url, "http://example.com/a");
        assert_eq!(first.header("content-type"), Some("application/json"));

        let second = transport.send(&TransportRequest::new(Method::GET, "b")).await.unwrap();
        assert_eq!(second.status, StatusCode::NOT_FOUND);
        assert_eq!(second.body, "gone");
        assert_eq!(transport.remaining(), 0);
    }

    #[tokio::test]
    async fn exhausted_mock_is_an_error() {
        let transport = MockTransport::new("http://example.com", Vec::new());
        let result = transport.send(&TransportRequest::new(Method::DELETE, "/x")).await;
        assert_eq!(
            result.unwrap_err(),
            TransportError::MockExhausted { method: "DELETE".into(), path: "x".into() }
        );
    }

    #[tokio::test]
    async fn keeps_repeated_headers() {
        let transport = MockTransport::new(
            "http://example.com",
            vec![MockResponse::new(401)
                .with_header("WWW-Authenticate", "Basic realm=\"a\"")
                .with_header("WWW-Authenticate", "Bearer realm=\"b\"")],
        );

        let response = transport.send(&TransportRequest::new(Method::GET, "x")).await.unwrap();
        let values: Vec<_> = response.header_values("www-authenticate").collect();
        assert_eq!(values, vec!["Basic realm=\"a\"", "Bearer realm=\"b\""]);
    }

    #[tokio::test]
    async fn simulates_transport_failures() {
        let transport = MockTransport::new(
            "http://example.com",
            vec![MockResponse::timeout(Duration::from_secs(3)), MockResponse::network_error()],
        );

        let request = TransportRequest::new(Method::GET, "x");
        assert!(matches!(
            transport.send(&request).await,
            Err(TransportError::Timeout { timeout, .. }) if timeout == Duration::from_secs(3)
        ));
        assert!(matches!(transport.send(&request).await, Err(TransportError::Network { .. })));
    }

    #[tokio::test]
    async fn invalid_header_name_is_reported() {
        let transport = MockTransport::new(
            "http://example.com",
            vec![MockResponse::new(200).with_header("bad header", "x")],
        );
        let result = transport.send(&TransportRequest::new(Method::GET, "x")).await;
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }
}
