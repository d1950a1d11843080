//! # Config Errors
//!
//! Every configuration error maps to REPLAY_CONFIG_INVALID and is raised
//! before any file or socket is touched.

use thiserror::Error;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Invalid configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    // ==================
    // Loading
    // ==================
    /// Config file could not be read
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// No source file given
    #[error("source file is required")]
    MissingSource,

    // ==================
    // Pacing
    // ==================
    /// Both a delay and a rate were given
    #[error("delay and rate are mutually exclusive")]
    ConflictingPacing,

    /// Delay (or the delay implied by a rate) too long to wait for
    #[error("{name} of {value} gives a per-record delay that is out of range")]
    PacingOutOfRange { name: &'static str, value: f64 },

    /// Negative or non-finite numeric setting
    #[error("{name} must be a finite, non-negative number (got {value})")]
    InvalidNumber { name: &'static str, value: f64 },

    // ==================
    // Records
    // ==================
    /// Delimiter is not exactly one character
    #[error("delimiter must be exactly one character (got {0:?})")]
    InvalidDelimiter(String),

    /// Per-key ordering without key columns
    #[error("order scope '{0}' requires at least one key column")]
    MissingKeyColumns(&'static str),

    /// Scope not supported by this command
    #[error("order scope '{0}' is not supported here")]
    UnsupportedScope(&'static str),

    /// Filter column and values must be given together
    #[error("filter column and filter values must be given together")]
    IncompleteFilter,

    // ==================
    // Output
    // ==================
    /// Batch size of zero
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    /// Negative byte limit
    #[error("batch byte limit must not be negative (got {0})")]
    NegativeBatchBytes(i64),

    /// Sample count without a diagnostic sink
    #[error("diag samples given without a diag sink")]
    SamplesWithoutSink,
}

impl ConfigError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        "REPLAY_CONFIG_INVALID"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ConfigError::ConflictingPacing.to_string(),
            "delay and rate are mutually exclusive"
        );
        assert_eq!(
            ConfigError::InvalidDelimiter("ab".into()).to_string(),
            "delimiter must be exactly one character (got \"ab\")"
        );
        assert_eq!(ConfigError::ZeroBatchSize.code(), "REPLAY_CONFIG_INVALID");
    }
}
