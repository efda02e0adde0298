//! Transaction log
//!
//! [`RecordingTransport`] wraps another transport and, when enabled, keeps
//! every request it forwards together with the result, in send order.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::transport::{Transport, TransportError, TransportRequest, TransportResponse};

/// A request that reached the transport and what came back
#[derive(Debug, Clone)]
pub struct Transaction {
    /// The request as sent
    pub request: TransportRequest,
    /// The response, or the error raised instead
    pub outcome: Result<TransportResponse, TransportError>,
}

/// Transport decorator that records transactions
pub struct RecordingTransport {
    inner: Arc<dyn Transport>,
    log: Option<Mutex<Vec<Transaction>>>,
}

impl RecordingTransport {
    /// Forward to `inner` without recording
    pub fn passthrough(inner: Arc<dyn Transport>) -> Self {
        Self { inner, log: None }
    }

    /// Forward to `inner` and record every transaction
    pub fn recording(inner: Arc<dyn Transport>) -> Self {
        Self { inner, log: Some(Mutex::new(Vec::new())) }
    }

    /// Whether transactions are being kept
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.log.is_some()
    }

    /// Snapshot of the log, oldest first; empty when not recording
    #[must_use]
    pub fn transactions(&self) -> Vec<Transaction> {
        self.log.as_ref().map(|log| log.lock().clone()).unwrap_or_default()
    }

    /// Number of recorded transactions
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.as_ref().map_or(0, |log| log.lock().len())
    }

    /// `true` when nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RecordingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingTransport")
            .field("base_uri", &self.inner.base_uri())
            .field("recorded", &self.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn base_uri(&self) -> &str {
        self.inner.base_uri()
    }

    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let result = self.inner.send(request).await;

        if let Some(log) = &self.log {
            log.lock().push(Transaction { request: request.clone(), outcome: result.clone() });
        }

        result
    }
}
