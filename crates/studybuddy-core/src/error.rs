//! Error types for the connection layer.
//!
//! Transport failures are not errors here: they feed the reconnect policy
//! through [`crate::ConnectionManager::handle_transport_error`] and only
//! surface once the policy is spent.

use thiserror::Error;

/// Errors the connection manager reports to its caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// `connect` was called without a bearer token.
    #[error("missing auth token")]
    MissingToken,

    /// Automatic reconnection gave up. Only a manual `connect` resumes.
    #[error("reconnect gave up after {attempts} attempts")]
    RetriesExhausted {
        /// Automatic attempts made before giving up.
        attempts: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_cause() {
        assert_eq!(ConnectionError::MissingToken.to_string(), "missing auth token");
        assert_eq!(
            ConnectionError::RetriesExhausted { attempts: 5 }.to_string(),
            "reconnect gave up after 5 attempts"
        );
    }
}
