//! WebSocket error types
//!
//! One enum per direction of traffic: the handshake, the outbound writer,
//! and the inbound frame reader.

use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur while establishing an authenticated connection
#[derive(Error, Debug)]
pub enum ConnectError {
    /// The hub URL could not be built from the configured host and port
    #[error("Invalid hub URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The transport could not be opened (host or port unreachable)
    #[error("Failed to connect to websocket at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    /// The hub answered the auth frame with something other than `auth_ok`
    #[error("Invalid authentication token{}", detail(.message))]
    InvalidToken { message: Option<String> },

    /// The whole handshake did not finish inside its time budget
    #[error("Handshake timed out after {0:?}")]
    Timeout(Duration),

    /// The hub closed the connection before authentication finished
    #[error("Connection closed during handshake")]
    Closed,

    /// Transport failure after the connection was opened
    #[error("Transport error during handshake: {0}")]
    Transport(#[from] tungstenite::Error),

    /// The auth frame could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConnectError {
    /// Whether the failure was caused by the credentials rather than the network
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ConnectError::InvalidToken { .. })
    }
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

/// Errors that can occur while writing to the hub
#[derive(Error, Debug)]
pub enum WriteError {
    /// Outbound message could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The frame could not be written to the connection
    #[error("Error writing to websocket: {0}")]
    Transport(#[source] tungstenite::Error),

    /// The connection was already closed
    #[error("WebSocket connection is closed")]
    Closed,
}

impl From<tungstenite::Error> for WriteError {
    fn from(e: tungstenite::Error) -> Self {
        match e {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                WriteError::Closed
            }
            other => WriteError::Transport(other),
        }
    }
}

/// Errors that terminate the frame reader loop
#[derive(Error, Debug)]
pub enum ReadError {
    /// The transport failed mid-session
    #[error("Error reading from websocket: {0}")]
    Transport(#[from] tungstenite::Error),

    /// The hub sent a close frame
    #[error("Hub closed the connection (code {code}): {reason}")]
    Closed { code: u16, reason: String },

    /// The underlying stream ended without a close frame
    #[error("WebSocket stream ended")]
    EndOfStream,
}

/// Result type alias for handshake operations
pub type ConnectResult<T> = Result<T, ConnectError>;

/// Result type alias for write operations
pub type WriteResult<T> = Result<T, WriteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_token_display() {
        let err = ConnectError::InvalidToken { message: None };
        assert_eq!(err.to_string(), "Invalid authentication token");

        let err = ConnectError::InvalidToken {
            message: Some("Invalid password".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Invalid authentication token: Invalid password"
        );
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_timeout_is_not_auth_failure() {
        let err = ConnectError::Timeout(Duration::from_secs(3));
        assert!(!err.is_auth_failure());
        assert_eq!(err.to_string(), "Handshake timed out after 3s");
    }

    #[test]
    fn test_closed_connection_maps_to_write_closed() {
        let err = WriteError::from(tungstenite::Error::AlreadyClosed);
        assert!(matches!(err, WriteError::Closed));

        let err = WriteError::from(tungstenite::Error::Utf8);
        assert!(matches!(err, WriteError::Transport(_)));
    }

    #[test]
    fn test_read_error_display() {
        let err = ReadError::Closed {
            code: 1000,
            reason: "bye".to_string(),
        };
        assert_eq!(err.to_string(), "Hub closed the connection (code 1000): bye");
    }
}
