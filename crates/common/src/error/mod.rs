//! Error classification shared across the Symplur crates.
//!
//! Every crate defines its own `thiserror` enum for the failures it can
//! produce. This module provides the common vocabulary used to reason about
//! those errors from the outside:
//!
//! 1. **`ErrorClassification` trait**: a standard interface for classifying
//!    errors by their characteristics (retryability, severity, criticality)
//!
//! 2. **`ErrorSeverity` enum**: a unified severity level used for logging
//!    decisions
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Informational, expected conditions | Resource not found, empty results |
//! | **Warning** | Degraded but operational | Rate limiting, timeouts, transient failures |
//! | **Error** | Failure requiring attention | Invalid responses, config errors |
//! | **Critical** | Cannot proceed without operator action | Rejected client credentials |
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use symplur_common::{ErrorClassification, ErrorSeverity};
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Timeout,
//!     Rejected,
//! }
//!
//! impl ErrorClassification for FetchError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Timeout)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Timeout => ErrorSeverity::Warning,
//!             Self::Rejected => ErrorSeverity::Error,
//!         }
//!     }
//!
//!     fn is_critical(&self) -> bool {
//!         false
//!     }
//!
//!     fn retry_after(&self) -> Option<Duration> {
//!         None
//!     }
//! }
//!
//! assert!(FetchError::Timeout.is_retryable());
//! assert_eq!(FetchError::Rejected.severity(), ErrorSeverity::Error);
//! ```

use std::fmt;
use std::time::Duration;

/// Standard interface for classifying errors
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are typically transient issues that may succeed if
    /// attempted again, such as:
    /// - Network timeouts
    /// - Rate limiting
    /// - Temporary service unavailability
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when a specific retry delay is recommended
    /// (e.g., from a Retry-After header), or `None` if no specific delay is
    /// suggested.
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl ErrorSeverity {
    /// Stable lowercase label suitable for structured log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_from_info_to_critical() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }

    #[test]
    fn severity_display_and_labels() {
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
        assert_eq!(ErrorSeverity::Critical.to_string(), "CRITICAL");
        assert_eq!(ErrorSeverity::Info.as_str(), "info");
        assert_eq!(ErrorSeverity::Error.as_str(), "error");
    }
}
