/// Crate-wide result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed transport errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection has dropped; no further sends will succeed for the
    /// remaining process lifetime.
    #[error("transport connection closed")]
    Closed,

    /// Connect-time handshake could not be built or completed.
    #[error("transport handshake failed: {message}")]
    Handshake { message: String },

    /// WebSocket error from the underlying stream.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// I/O error from the underlying stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wire encoding failed for an outbound frame.
    #[error(transparent)]
    Protocol(#[from] pontis_protocol::Error),
}

impl Error {
    #[must_use]
    pub fn handshake(message: impl std::fmt::Display) -> Self {
        Self::Handshake {
            message: message.to_string(),
        }
    }
}
