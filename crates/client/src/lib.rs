//! Symplur API client
//!
//! Authenticates with the OAuth 2.0 client-credentials grant, attaches the
//! bearer token to every request and recovers from token expiry by
//! re-authenticating once and resending.
//!
//! # Modules
//! - [`api`]: the authenticated client and its single-attempt outcomes
//! - [`auth`]: credentials, token lifecycle, external token cache
//! - [`blocking`]: synchronous wrapper over the async client
//! - [`config`]: transport settings and the environment/file loader
//! - [`errors`]: [`ApiError`] and its classification
//! - [`http`]: transport seam, `reqwest` transport, mocks, recording
//!
//! # Example
//!
//! ```no_run
//! use symplur_client::{ApiClient, ClientConfig, Credentials};
//!
//! # async fn run() -> Result<(), symplur_client::ApiError> {
//! let credentials = Credentials::new("my-client-id", "my-client-secret")?;
//! let mut client = ApiClient::new(credentials, ClientConfig::default())?;
//!
//! let hashtag: Option<serde_json::Value> = client.get("hashtags/healthcare", &[]).await?;
//! # let _ = hashtag;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod auth;
pub mod blocking;
pub mod config;
pub mod errors;
pub mod http;

pub use api::{ApiClient, ApiClientBuilder};
pub use auth::{Credentials, FnTokenCache, InMemoryTokenCache, TokenCache};
pub use config::{ClientConfig, Settings};
pub use errors::{ApiError, ApiErrorCategory};
pub use http::{MockResponse, Transaction};
