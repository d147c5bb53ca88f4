//! Session error types

use thiserror::Error;

use crate::websocket::{ConnectError, ReadError, WriteError};

/// Errors that end a session
#[derive(Error, Debug)]
pub enum SessionError {
    /// The handshake failed
    #[error("Connection error: {0}")]
    Connect(#[from] ConnectError),

    /// A subscription request could not be written; no events would arrive
    #[error("Subscription failed: {0}")]
    Subscribe(#[from] WriteError),

    /// The connection failed mid-session
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// The reader task panicked or was aborted
    #[error("Reader task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
