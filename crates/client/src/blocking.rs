//! Synchronous client
//!
//! Wraps [`crate::ApiClient`] with a private current-thread runtime. Each call
//! blocks until the request, including any re-authentication, has finished.
//! Do not call from inside an async runtime.

use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::runtime::{Builder, Runtime};

use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::errors::ApiError;
use crate::http::{MockResponse, RequestParams, Transaction};

/// Blocking Symplur API client
#[derive(Debug)]
pub struct ApiClient {
    inner: crate::ApiClient,
    runtime: Runtime,
}

impl ApiClient {
    /// Create a client that talks to `config.base_uri` over HTTP
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] for an invalid configuration or if the
    /// runtime cannot be started.
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, ApiError> {
        Self::from_async(crate::ApiClient::new(credentials, config)?)
    }

    /// Drive an existing async client synchronously
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the runtime cannot be started.
    pub fn from_async(inner: crate::ApiClient) -> Result<Self, ApiError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to start runtime: {e}")))?;
        Ok(Self { inner, runtime })
    }

    /// `GET` with query-string parameters
    ///
    /// # Errors
    ///
    /// See [`crate::ApiClient::request_json`].
    pub fn get<T: DeserializeOwned>(
        &mut self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        self.request_json(Method::GET, path, RequestParams::query(query.iter().copied()))
    }

    /// `POST` with form parameters
    ///
    /// # Errors
    ///
    /// See [`crate::ApiClient::request_json`].
    pub fn post<T: DeserializeOwned>(
        &mut self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        self.request_json(Method::POST, path, RequestParams::form(form.iter().copied()))
    }

    /// `PUT` with form parameters
    ///
    /// # Errors
    ///
    /// See [`crate::ApiClient::request_json`].
    pub fn put<T: DeserializeOwned>(
        &mut self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        self.request_json(Method::PUT, path, RequestParams::form(form.iter().copied()))
    }

    /// `PATCH` with form parameters
    ///
    /// # Errors
    ///
    /// See [`crate::ApiClient::request_json`].
    pub fn patch<T: DeserializeOwned>(
        &mut self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        self.request_json(Method::PATCH, path, RequestParams::form(form.iter().copied()))
    }

    /// `DELETE` with form parameters
    ///
    /// # Errors
    ///
    /// See [`crate::ApiClient::request_json`].
    pub fn delete<T: DeserializeOwned>(
        &mut self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>, ApiError> {
        self.request_json(Method::DELETE, path, RequestParams::form(form.iter().copied()))
    }

    /// Blocking [`crate::ApiClient::request_json`]
    ///
    /// # Errors
    ///
    /// See [`crate::ApiClient::request_json`].
    pub fn request_json<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        params: RequestParams,
    ) -> Result<Option<T>, ApiError> {
        self.runtime.block_on(self.inner.request_json(method, path, params))
    }

    /// Current access token, fetching one if needed
    ///
    /// # Errors
    ///
    /// See [`crate::ApiClient::access_token`].
    pub fn access_token(&mut self) -> Result<String, ApiError> {
        self.runtime.block_on(self.inner.access_token())
    }

    /// Use `token` for subsequent requests
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.runtime.block_on(self.inner.set_access_token(token));
    }

    /// Forget the current token
    pub fn invalidate_token(&mut self) {
        self.runtime.block_on(self.inner.invalidate_token());
    }

    /// See [`crate::ApiClient::set_mock_responses`]
    pub fn set_mock_responses(&mut self, responses: Vec<MockResponse>) {
        self.inner.set_mock_responses(responses);
    }

    /// See [`crate::ApiClient::transaction_log`]
    #[must_use]
    pub fn transaction_log(&self) -> Vec<Transaction> {
        self.inner.transaction_log()
    }

    /// Transport settings
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        self.inner.config()
    }
}
