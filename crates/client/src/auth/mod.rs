//! OAuth 2.0 client-credentials authentication
//!
//! Provides:
//! - [`Credentials`]: validated client ID/secret pair
//! - [`TokenManager`]: token lookup, exchange and invalidation
//! - [`TokenCache`]: optional external store for the access token
//! - `WWW-Authenticate` challenge classification

pub mod cache;
pub mod challenge;
pub mod token_manager;
pub mod types;

pub use cache::{FnTokenCache, InMemoryTokenCache, TokenCache, ACCESS_TOKEN_KEY};
pub use challenge::{has_challenge, is_invalid_client, is_token_rejected, BASIC_SCHEME, BEARER_SCHEME};
pub use token_manager::{TokenManager, TOKEN_PATH};
pub use types::{Credentials, OAuthErrorBody, TokenResponse};
