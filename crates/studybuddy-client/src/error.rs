//! Client error types.

use thiserror::Error;

/// Errors from the REST API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Base URL cannot be extended with path segments.
    #[error("invalid api url: {0}")]
    InvalidUrl(String),

    /// Request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Server answered with a non-success status.
    #[error("{path} returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request path.
        path: String,
    },

    /// Response body did not match the expected schema.
    #[error("decode failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// Returns true if repeating the request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidUrl(_) | Self::Decode(_) => false,
        }
    }
}

/// Errors from the WebSocket transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Upgrade request could not be built from the socket URL and token.
    #[error("invalid socket request: {0}")]
    InvalidRequest(String),

    /// Socket failed to open or dropped.
    #[error("connection failed: {0}")]
    Connection(String),
}

/// Errors loading [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config text is not valid TOML for the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced by the network driver and session handle.
#[derive(Debug, Error)]
pub enum DriverError {
    /// REST failure outside a fetch task.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// WebSocket failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration was rejected.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The session task is gone.
    #[error("session closed")]
    SessionClosed,

    /// The session task panicked or was cancelled.
    #[error("session task failed: {0}")]
    Join(String),
}
