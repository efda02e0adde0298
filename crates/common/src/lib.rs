//! Shared utilities for the Symplur client crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - (always on): error classification shared by every crate
//! - `observability`: `tracing-subscriber` setup for binaries and tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod error;

#[cfg(feature = "observability")]
pub mod observability;

// Re-export commonly used types and traits for convenience
pub use error::{ErrorClassification, ErrorSeverity};
#[cfg(feature = "observability")]
pub use observability::{init_tracing, LogFormat};
