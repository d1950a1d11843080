//! Replay error types
//!
//! Error codes:
//! - REPLAY_SOURCE_NOT_FOUND / REPLAY_SOURCE_READ_FAILED (FATAL) - from the record source
//! - REPLAY_TRANSPORT_FAILED (ERROR) - write failed for a reason other than the peer leaving
//!
//! A peer that went away is not an error; see [`is_peer_gone`].

use std::fmt;
use std::io;

use crate::source::SourceError;

/// Replay error
#[derive(Debug)]
pub enum ReplayError {
    /// Source missing or unreadable. Not retried.
    Source(SourceError),
    /// Transport write failed. Ends the session only.
    Transport(io::Error),
}

impl ReplayError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ReplayError::Source(e) => e.code().code(),
            ReplayError::Transport(_) => "REPLAY_TRANSPORT_FAILED",
        }
    }

    /// Returns the error message without the code
    pub fn message(&self) -> String {
        match self {
            ReplayError::Source(e) => e.message().to_string(),
            ReplayError::Transport(e) => e.to_string(),
        }
    }

    /// Fatal errors stop the server; others end the current session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReplayError::Source(_))
    }
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Source(e) => write!(f, "{}", e),
            ReplayError::Transport(e) => write!(f, "{}: {}", self.code(), e),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::Source(e) => Some(e),
            ReplayError::Transport(e) => Some(e),
        }
    }
}

impl From<SourceError> for ReplayError {
    fn from(e: SourceError) -> Self {
        ReplayError::Source(e)
    }
}

/// Result type for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;

/// True if a write error means the consumer disconnected.
pub fn is_peer_gone(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::WriteZero
    )
}
