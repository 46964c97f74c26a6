//! Streaming transports to the downstream agent.
//!
//! Exactly one transport is active per process: a WebSocket client to a
//! remote endpoint, or a Unix-pipe client to a co-located process. Both
//! carry the same wire envelope and expose the same contract: `connect`
//! registers an inbound request handler, `send` suspends until the write is
//! accepted, and a dropped connection is permanent for the remaining
//! process lifetime.

pub mod error;
#[cfg(unix)]
pub mod pipe;
pub mod websocket;

mod dispatch;

use {
    async_trait::async_trait,
    pontis_protocol::{StreamingRequest, StreamingResponse, wire::WireFrame},
    secrecy::Secret,
};

pub use error::{Error, Result};
#[cfg(unix)]
pub use pipe::PipeTransport;
pub use websocket::WebSocketTransport;

/// Inbound side of a transport: invoked from the receive loop whenever a
/// complete request frame arrives from the peer. The returned response is
/// written back once the handler completes.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle_request(&self, request: StreamingRequest) -> StreamingResponse;
}

/// Outbound side of a transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Queue a frame for the peer. Suspends until the connection task
    /// accepts the write; fails with [`Error::Closed`] once the connection
    /// has dropped.
    async fn send(&self, frame: WireFrame) -> Result<()>;

    /// Whether the connection task is still running.
    fn is_connected(&self) -> bool;
}

/// Authentication material supplied at WebSocket connect time. The pipe
/// transport needs none: its peer is co-located on the same host.
pub struct AuthHeaders {
    /// Bearer token presented in the `authorization` header.
    pub bearer: Secret<String>,
    /// Channel-identity tag presented in the `channelid` header.
    pub channel_id: String,
}
