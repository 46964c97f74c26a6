/// Crate-wide result type for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An inbound frame violates the wire contract and cannot be decoded
    /// into an activity.
    #[error("malformed frame: {message}")]
    MalformedFrame { message: String },

    /// A wire frame exceeds the configured size cap.
    #[error("frame of {size} bytes exceeds the {limit} byte limit")]
    Oversized { size: usize, limit: usize },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn malformed(message: impl std::fmt::Display) -> Self {
        Self::MalformedFrame {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn oversized(size: usize) -> Self {
        Self::Oversized {
            size,
            limit: crate::MAX_FRAME_BYTES,
        }
    }
}
