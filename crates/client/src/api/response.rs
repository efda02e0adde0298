//! Single-attempt outcomes
//!
//! One pass through the transport ends in exactly one [`AttemptOutcome`].
//! Only [`crate::ApiClient::request_json`] decides what to do with an
//! `Unauthorized` outcome.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::auth::is_token_rejected;
use crate::errors::ApiError;
use crate::http::TransportResponse;

/// Which pass over a request this is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Initial send with whatever token is current
    First,
    /// The one resend after invalidating a rejected token
    Retry,
}

impl Attempt {
    /// Label for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Retry => "retry",
        }
    }
}

/// Result of one pass over a request
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    /// 2xx with a decodable body
    Success(T),
    /// The API rejected the access token (`Bearer` challenge)
    Unauthorized(Box<TransportResponse>),
    /// 404
    NotFound,
    /// Anything else
    Failed(ApiError),
}

/// Sort a raw response into an [`AttemptOutcome`].
///
/// A `Bearer` challenge wins over `404` when a server sends both.
pub fn classify<T: DeserializeOwned>(response: TransportResponse) -> AttemptOutcome<T> {
    if response.status.is_success() {
        return match decode_json(response.status, &response.body) {
            Ok(value) => AttemptOutcome::Success(value),
            Err(err) => AttemptOutcome::Failed(err),
        };
    }

    if is_token_rejected(&response) {
        return AttemptOutcome::Unauthorized(Box::new(response));
    }

    if response.status == StatusCode::NOT_FOUND {
        return AttemptOutcome::NotFound;
    }

    AttemptOutcome::Failed(ApiError::from_response(&response))
}

/// Decode a success body.
///
/// `204 No Content` and `205 Reset Content` carry no body and decode as JSON
/// `null`, so `()`, `Option<_>` and `serde_json::Value` targets succeed. Any
/// other success whose body is a literal `null` is rejected.
///
/// # Errors
///
/// Returns [`ApiError::BadJson`] with the raw body when decoding fails.
pub fn decode_json<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        return serde_json::from_value(serde_json::Value::Null)
            .map_err(|err| ApiError::bad_json(&err, body));
    }

    if is_json_null(body) {
        let err = <serde_json::Error as serde::de::Error>::custom("response body is JSON null");
        return Err(ApiError::bad_json(&err, body));
    }

    serde_json::from_str(body).map_err(|err| ApiError::bad_json(&err, body))
}

fn is_json_null(body: &str) -> bool {
    body.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r')) == "null"
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, WWW_AUTHENTICATE};
    use serde_json::{json, Value};

    use super::*;

    fn response(status: u16, challenge: Option<&'static str>, body: &str) -> TransportResponse {
        let mut headers = HeaderMap::new();
        if let Some(challenge) = challenge {
            headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }
        TransportResponse {
            status: StatusCode::from_u16(status).unwrap(),
            url: "http://example.com/v1/foo".into(),
            headers,
            body: body.into(),
        }
    }

    #[test]
    fn success_decodes_body() {
        let outcome: AttemptOutcome<Value> = classify(response(200, None, r#"{"foo":"bar"}"#));
        assert!(matches!(outcome, AttemptOutcome::Success(ref v) if *v == json!({"foo": "bar"})));
    }

    #[test]
    fn success_with_html_is_bad_json() {
        let outcome: AttemptOutcome<Value> =
            classify(response(200, None, "<html><body>Foo!</body></html>"));
        assert!(matches!(
            outcome,
            AttemptOutcome::Failed(ApiError::BadJson { ref body, .. }) if body == "<html><body>Foo!</body></html>"
        ));
    }

    #[test]
    fn bearer_challenge_is_unauthorized() {
        let outcome: AttemptOutcome<Value> =
            classify(response(401, Some(r#"Bearer realm="Foo", error="invalid_token""#), ""));
        assert!(matches!(outcome, AttemptOutcome::Unauthorized(ref r) if r.status == StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn bearer_challenge_beats_not_found() {
        let outcome: AttemptOutcome<Value> = classify(response(404, Some("Bearer"), ""));
        assert!(matches!(outcome, AttemptOutcome::Unauthorized(_)));
    }

    #[test]
    fn not_found_is_its_own_outcome() {
        let outcome: AttemptOutcome<Value> = classify(response(404, None, "gone"));
        assert!(matches!(outcome, AttemptOutcome::NotFound));
    }

    #[test]
    fn unauthorized_without_bearer_fails() {
        let outcome: AttemptOutcome<Value> =
            classify(response(401, Some(r#"Basic realm="Yak""#), ""));
        assert!(matches!(
            outcome,
            AttemptOutcome::Failed(ApiError::Status { status, .. }) if status == StatusCode::UNAUTHORIZED
        ));
    }

    #[test]
    fn server_error_fails_with_status() {
        let outcome: AttemptOutcome<Value> = classify(response(503, None, "down"));
        assert!(matches!(outcome, AttemptOutcome::Failed(ref e) if e.status() == Some(StatusCode::SERVICE_UNAVAILABLE)));
    }

    #[test]
    fn no_content_decodes_as_null() {
        let unit: () = decode_json(StatusCode::NO_CONTENT, "").unwrap();
        assert_eq!(unit, ());
        let value: Value = decode_json(StatusCode::RESET_CONTENT, "").unwrap();
        assert_eq!(value, Value::Null);
        let option: Option<String> = decode_json(StatusCode::NO_CONTENT, "").unwrap();
        assert_eq!(option, None);
    }

    #[test]
    fn no_content_into_struct_is_bad_json() {
        #[derive(Debug, serde::Deserialize)]
        struct Thing {
            #[allow(dead_code)]
            id: u32,
        }
        let result: Result<Thing, _> = decode_json(StatusCode::NO_CONTENT, "");
        assert!(matches!(result, Err(ApiError::BadJson { .. })));
    }

    #[test]
    fn literal_null_body_is_bad_json() {
        let result: Result<Value, _> = decode_json(StatusCode::OK, " null\n");
        match result {
            Err(ApiError::BadJson { category, body, .. }) => {
                assert_eq!(category, serde_json::error::Category::Data);
                assert_eq!(body, " null\n");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let outcome: AttemptOutcome<Option<Value>> = classify(response(200, None, "null"));
        assert!(matches!(outcome, AttemptOutcome::Failed(ApiError::BadJson { .. })));
    }

    #[test]
    fn attempt_labels() {
        assert_eq!(Attempt::First.as_str(), "first");
        assert_eq!(Attempt::Retry.as_str(), "retry");
    }
}
