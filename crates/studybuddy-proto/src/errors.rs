//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Serialization of an outbound event failed.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Frame text is not a valid event envelope, or its data does not match
    /// the event's schema.
    #[error("decode failed: {0}")]
    Decode(String),

    /// Envelope carried an event name this client does not understand.
    ///
    /// Drivers skip these rather than tearing down the connection, so newer
    /// servers can add events without breaking older clients.
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

impl ProtocolError {
    /// Returns true if the frame can be skipped without treating the
    /// connection as broken.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::UnknownEvent(_))
    }
}
