//! `WWW-Authenticate` challenge classification
//!
//! Two challenges matter:
//! - `Bearer ...` on an API response: the access token was rejected and can
//!   be replaced.
//! - `Basic ...` with an `invalid_client` body on the token endpoint: the
//!   client ID/secret pair itself was rejected.
//!
//! Scheme names compare case-insensitively (RFC 7235 §2.1) and must be
//! followed by a space or end the value.

use reqwest::header::WWW_AUTHENTICATE;

use super::types::OAuthErrorBody;
use crate::http::TransportResponse;

/// Scheme naming a rejected access token
pub const BEARER_SCHEME: &str = "Bearer";

/// Scheme naming rejected client credentials
pub const BASIC_SCHEME: &str = "Basic";

/// OAuth error code for unknown client or bad secret
pub const INVALID_CLIENT: &str = "invalid_client";

/// Whether a single header value opens with `scheme`.
#[must_use]
pub fn starts_with_scheme(value: &str, scheme: &str) -> bool {
    let value = value.trim_start();
    let Some(prefix) = value.get(..scheme.len()) else {
        return false;
    };
    prefix.eq_ignore_ascii_case(scheme)
        && value[scheme.len()..].chars().next().map_or(true, |c| c == ' ')
}

/// Whether any `WWW-Authenticate` value on the response uses `scheme`
#[must_use]
pub fn has_challenge(response: &TransportResponse, scheme: &str) -> bool {
    response
        .header_values(WWW_AUTHENTICATE.as_str())
        .any(|value| starts_with_scheme(value, scheme))
}

/// Access token rejected: a client error carrying a `Bearer` challenge
#[must_use]
pub fn is_token_rejected(response: &TransportResponse) -> bool {
    response.status.is_client_error() && has_challenge(response, BEARER_SCHEME)
}

/// Client credentials rejected: a client error with a `Basic` challenge and an
/// `invalid_client` JSON body
#[must_use]
pub fn is_invalid_client(response: &TransportResponse) -> bool {
    if !response.status.is_client_error() || !has_challenge(response, BASIC_SCHEME) {
        return false;
    }

    serde_json::from_str::<OAuthErrorBody>(&response.body)
        .map(|body| body.error == INVALID_CLIENT)
        .unwrap_or(false)
}
