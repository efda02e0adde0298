//! HTTP transport layer
//!
//! - [`Transport`]: the seam the client sends through
//! - [`ReqwestTransport`]: production implementation
//! - [`MockTransport`]: canned responses for tests
//! - [`RecordingTransport`]: transaction log decorator

pub mod client;
pub mod mock;
pub mod recording;
pub mod transport;

pub use client::{default_user_agent, ReqwestTransport, ReqwestTransportBuilder, DEFAULT_TIMEOUT};
pub use mock::{MockResponse, MockTransport};
pub use recording::{RecordingTransport, Transaction};
pub use transport::{
    BasicAuth, RequestParams, Transport, TransportError, TransportRequest, TransportResponse,
};
