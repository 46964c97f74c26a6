/// Crate-wide result type for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed bridge errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The downstream connection failed or has dropped. Not retried here;
    /// the inbound channel decides whether to surface this to the user.
    #[error("downstream transport unavailable: {0}")]
    Transport(#[from] pontis_transport::Error),

    /// Bearer-token acquisition failed. Fatal for the construction
    /// attempt; a new relay instance is required to retry.
    #[error("credential acquisition failed: {message}")]
    Credential { message: String },

    /// Frame encoding or decoding failed.
    #[error(transparent)]
    Protocol(#[from] pontis_protocol::Error),
}

impl Error {
    #[must_use]
    pub fn credential(message: impl std::fmt::Display) -> Self {
        Self::Credential {
            message: message.to_string(),
        }
    }
}
