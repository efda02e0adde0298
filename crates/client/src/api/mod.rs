//! Authenticated request execution

pub mod client;
pub mod response;

pub use client::{ApiClient, ApiClientBuilder};
pub use response::{classify, decode_json, Attempt, AttemptOutcome};
