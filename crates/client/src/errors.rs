//! Client error types
//!
//! Every failure surfaced by [`crate::ApiClient`] is an [`ApiError`]. Only two
//! response shapes are handled locally and never show up here: a `Bearer`
//! challenge (answered by one re-authentication) and `404 Not Found`
//! (returned as `Ok(None)`).

use std::time::Duration;

use reqwest::header::{RETRY_AFTER, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use symplur_common::{ErrorClassification, ErrorSeverity};
use thiserror::Error;

use crate::http::{TransportError, TransportResponse};

/// Categories of client errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Bad construction or configuration - non-retryable
    Config,
    /// Client ID/secret rejected by the token endpoint - non-retryable
    Credentials,
    /// Client errors (4xx) - non-retryable
    Client,
    /// Server errors (5xx) - retryable
    Server,
    /// Network/connection errors and timeouts - retryable
    Network,
    /// Response body could not be decoded - non-retryable
    Response,
}

impl ApiErrorCategory {
    /// Stable label for logging
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Credentials => "credentials",
            Self::Client => "client",
            Self::Server => "server",
            Self::Network => "network",
            Self::Response => "response",
        }
    }
}

/// Client operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Empty credentials, invalid base URI, unusable headers
    #[error("Configuration error: {0}")]
    Config(String),

    /// The token endpoint answered `invalid_client` with a `Basic` challenge
    #[error("Invalid or missing client credentials for {base_uri}")]
    InvalidCredentials {
        /// Base URI the credentials were presented to
        base_uri: String,
    },

    /// Any non-success response this client does not interpret
    #[error("{url} returned status {status}")]
    Status {
        /// Response status
        status: StatusCode,
        /// Absolute URL of the request
        url: String,
        /// `WWW-Authenticate` header, if the server sent one
        www_authenticate: Option<String>,
        /// Seconds from a numeric `Retry-After` header
        retry_after: Option<Duration>,
        /// Raw response body
        body: String,
    },

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// The transport gave up waiting for a response
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Expected JSON, got something else
    #[error("JSON error {category:?}: \"{message}\" while trying to parse API response: {body}")]
    BadJson {
        /// Decoder error class (syntax, data, eof, io)
        category: serde_json::error::Category,
        /// 1-based line of the failure, 0 when not applicable
        line: usize,
        /// 1-based column of the failure, 0 when not applicable
        column: usize,
        /// Decoder message
        message: String,
        /// Raw response body
        body: String,
    },

    /// The token endpoint answered 2xx without a usable token
    #[error("Token endpoint returned an empty access token")]
    EmptyAccessToken,

    /// Transport misuse, e.g. a mock with no responses left
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Build a [`ApiError::Status`] from a response nobody handled.
    #[must_use]
    pub fn from_response(response: &TransportResponse) -> Self {
        let retry_after = response
            .header(RETRY_AFTER.as_str())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        Self::Status {
            status: response.status,
            url: response.url.clone(),
            www_authenticate: response.header(WWW_AUTHENTICATE.as_str()).map(str::to_string),
            retry_after,
            body: response.body.clone(),
        }
    }

    /// Build a [`ApiError::BadJson`] from a decoder error and the offending body.
    #[must_use]
    pub fn bad_json(err: &serde_json::Error, body: &str) -> Self {
        Self::BadJson {
            category: err.classify(),
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
            body: body.to_string(),
        }
    }

    /// Status code for [`ApiError::Status`], `None` otherwise
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error category for this error
    #[must_use]
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Config(_) | Self::Transport(_) => ApiErrorCategory::Config,
            Self::InvalidCredentials { .. } => ApiErrorCategory::Credentials,
            Self::Status { status, .. } if status.is_server_error() => ApiErrorCategory::Server,
            Self::Status { .. } => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::BadJson { .. } | Self::EmptyAccessToken => ApiErrorCategory::Response,
        }
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Network(_) | Self::Timeout(_) => true,
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Status { status, .. } if status.is_client_error() => ErrorSeverity::Warning,
            Self::Network(_) | Self::Timeout(_) => ErrorSeverity::Warning,
            Self::InvalidCredentials { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::InvalidCredentials { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { timeout, .. } => Self::Timeout(timeout),
            TransportError::Network { .. } => Self::Network(err.to_string()),
            TransportError::InvalidRequest(message) => Self::Config(message),
            TransportError::MockExhausted { .. } => Self::Transport(err.to_string()),
        }
    }
}
