//! Record source error types
//!
//! Error codes:
//! - REPLAY_SOURCE_NOT_FOUND (FATAL) - backing file missing at open or pass start
//! - REPLAY_SOURCE_READ_FAILED (FATAL) - backing file unreadable

use std::fmt;
use std::io;
use std::path::Path;

/// Record source error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorCode {
    /// Source file does not exist or is not a regular file
    ReplaySourceNotFound,
    /// Source file could not be opened or read
    ReplaySourceReadFailed,
}

impl SourceErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SourceErrorCode::ReplaySourceNotFound => "REPLAY_SOURCE_NOT_FOUND",
            SourceErrorCode::ReplaySourceReadFailed => "REPLAY_SOURCE_READ_FAILED",
        }
    }
}

impl fmt::Display for SourceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Record source error. Never retried.
#[derive(Debug)]
pub struct SourceError {
    code: SourceErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl SourceError {
    /// Source file missing
    pub fn not_found(path: &Path) -> Self {
        Self {
            code: SourceErrorCode::ReplaySourceNotFound,
            message: format!("Source file not found: {}", path.display()),
            source: None,
        }
    }

    /// Source file unreadable
    pub fn read_failed(path: &Path, source: io::Error) -> Self {
        Self {
            code: SourceErrorCode::ReplaySourceReadFailed,
            message: format!("Failed to read source file: {}", path.display()),
            source: Some(source),
        }
    }

    /// Maps an open error, distinguishing a missing file.
    pub fn from_open(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::not_found(path)
        } else {
            Self::read_failed(path, err)
        }
    }

    pub fn code(&self) -> SourceErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True for a missing source file
    pub fn is_not_found(&self) -> bool {
        self.code == SourceErrorCode::ReplaySourceNotFound
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for record source operations
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_mapping() {
        let path = Path::new("/nope/data.csv");
        let missing = SourceError::from_open(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(missing.is_not_found());
        assert_eq!(missing.code().code(), "REPLAY_SOURCE_NOT_FOUND");

        let denied =
            SourceError::from_open(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(!denied.is_not_found());
        assert!(denied.to_string().contains("REPLAY_SOURCE_READ_FAILED"));
        assert!(denied.to_string().contains("caused by"));
    }
}
