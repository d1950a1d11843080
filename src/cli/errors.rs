//! CLI-specific error types
//!
//! All CLI errors are FATAL: printed as `CODE: message`, exit status 1.

use std::fmt;
use std::io;

use crate::clean::CleanError;
use crate::config::ConfigError;
use crate::replay::ReplayError;
use crate::source::SourceError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration rejected before any I/O
    ConfigInvalid,
    /// Source file missing
    SourceNotFound,
    /// Source file unreadable
    SourceReadFailed,
    /// Listener or socket failure
    TransportFailed,
    /// Cleaned file could not be written
    OutputFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigInvalid => "REPLAY_CONFIG_INVALID",
            Self::SourceNotFound => "REPLAY_SOURCE_NOT_FOUND",
            Self::SourceReadFailed => "REPLAY_SOURCE_READ_FAILED",
            Self::TransportFailed => "REPLAY_TRANSPORT_FAILED",
            Self::OutputFailed => "REPLAY_OUTPUT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_invalid(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigInvalid, msg)
    }

    /// Socket or listener error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::TransportFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_invalid(e.to_string())
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        let code = if e.is_not_found() {
            CliErrorCode::SourceNotFound
        } else {
            CliErrorCode::SourceReadFailed
        };
        Self::new(code, e.message())
    }
}

impl From<ReplayError> for CliError {
    fn from(e: ReplayError) -> Self {
        match e {
            ReplayError::Source(source) => source.into(),
            ReplayError::Transport(io) => Self::transport(io.to_string()),
        }
    }
}

impl From<CleanError> for CliError {
    fn from(e: CleanError) -> Self {
        match e {
            CleanError::Source(source) => source.into(),
            other => Self::new(CliErrorCode::OutputFailed, other.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::transport(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_display_is_code_then_message() {
        let err: CliError = ConfigError::ZeroBatchSize.into();
        assert_eq!(
            err.to_string(),
            "REPLAY_CONFIG_INVALID: batch size must be at least 1"
        );
    }

    #[test]
    fn test_source_errors_keep_their_code() {
        let err: CliError = ReplayError::Source(SourceError::not_found(Path::new("a.csv"))).into();
        assert_eq!(err.code(), CliErrorCode::SourceNotFound);
        assert!(err.message().contains("a.csv"));
    }
}
