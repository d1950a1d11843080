//! Configuration
//!
//! [`ReplayConfig`] is read from an optional JSON file (every field has a
//! default) and then overridden by command-line flags. [`CleanConfig`] is
//! built from flags only. Both are validated before any I/O begins.

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::filter::InclusionFilter;
use crate::observability::DiagTarget;
use crate::ordering::{OrderScope, OrderingConfig, UnparsablePolicy};
use crate::pacer::{BatchLimits, Pacing};
use crate::server::SessionSettings;
use crate::source::{SourceMode, SourceOptions};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 32323;

/// Replay server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    /// Delimited text file to replay (required)
    pub source: Option<PathBuf>,
    pub host: String,
    pub port: u16,

    // --- Record source ---
    pub delimiter: String,
    pub skip_header: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub preload: bool,

    // --- Ordering ---
    pub ts_col: usize,
    pub key_cols: Vec<usize>,
    pub order_scope: OrderScope,
    pub drop_equal: bool,
    /// Seconds added to the last accepted instant on repair (0 = off)
    pub repair_increment: f64,
    /// Seconds added on an exact tie (0 = off)
    pub nudge_increment: f64,
    pub unparsable: UnparsablePolicy,

    // --- Filter ---
    pub filter_col: Option<usize>,
    pub filter_values: Vec<String>,

    // --- Output ---
    pub batch_size: usize,
    /// Byte bound per batch; 0 disables it
    pub batch_bytes: Option<i64>,
    /// Seconds per record
    pub delay: Option<f64>,
    /// Records per second
    pub rate: Option<f64>,

    // --- Diagnostics ---
    /// `none`, `stdout`, `stderr` or a file path
    pub diag: Option<String>,
    /// Events written per kind per pass (0 = all)
    pub diag_samples: Option<u64>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            source: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            delimiter: ",".to_string(),
            skip_header: false,
            looping: false,
            preload: false,
            ts_col: 0,
            key_cols: Vec::new(),
            order_scope: OrderScope::Disabled,
            drop_equal: false,
            repair_increment: 0.0,
            nudge_increment: 0.0,
            unparsable: UnparsablePolicy::Forward,
            filter_col: None,
            filter_values: Vec::new(),
            batch_size: 1,
            batch_bytes: None,
            delay: None,
            rate: None,
            diag: None,
            diag_samples: None,
        }
    }
}

impl ReplayConfig {
    /// Loads a config file. Validation is left to the caller so that
    /// command-line overrides can be applied first.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: ReplayConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Checks the configuration. Touches no file or socket.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source.as_ref().map_or(true, |p| p.as_os_str().is_empty()) {
            return Err(ConfigError::MissingSource);
        }

        if self.delay.is_some() && self.rate.is_some() {
            return Err(ConfigError::ConflictingPacing);
        }
        if let Some(delay) = self.delay {
            check_number("delay", delay)?;
            if !Pacing::delay_in_range(delay) {
                return Err(ConfigError::PacingOutOfRange { name: "delay", value: delay });
            }
        }
        if let Some(rate) = self.rate {
            check_number("rate", rate)?;
            if rate > 0.0 && !Pacing::delay_in_range(1.0 / rate) {
                return Err(ConfigError::PacingOutOfRange { name: "rate", value: rate });
            }
        }
        check_number("repair_increment", self.repair_increment)?;
        check_number("nudge_increment", self.nudge_increment)?;

        parse_delimiter(&self.delimiter)?;

        if self.order_scope.uses_keys() && self.key_cols.is_empty() {
            return Err(ConfigError::MissingKeyColumns(self.order_scope.as_str()));
        }

        if self.filter_col.is_some() != !self.filter_values.is_empty() {
            return Err(ConfigError::IncompleteFilter);
        }

        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if let Some(bytes) = self.batch_bytes {
            if bytes < 0 {
                return Err(ConfigError::NegativeBatchBytes(bytes));
            }
        }

        if self.diag_samples.is_some() && self.diag_target().is_none() {
            return Err(ConfigError::SamplesWithoutSink);
        }

        Ok(())
    }

    /// Delimiter as a char. `,` if the configured value is invalid.
    pub fn delimiter_char(&self) -> char {
        parse_delimiter(&self.delimiter).unwrap_or(',')
    }

    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            delimiter: self.delimiter_char(),
            skip_header: self.skip_header,
            mode: if self.preload {
                SourceMode::Preload
            } else {
                SourceMode::Streaming
            },
        }
    }

    pub fn ordering_config(&self) -> OrderingConfig {
        OrderingConfig::with_scope(self.order_scope)
            .ts_col(self.ts_col)
            .key_cols(self.key_cols.clone())
            .drop_equal(self.drop_equal)
            .repair(self.repair_increment)
            .nudge(self.nudge_increment)
            .unparsable(self.unparsable)
    }

    pub fn inclusion_filter(&self) -> Option<InclusionFilter> {
        self.filter_col
            .map(|col| InclusionFilter::new(col, self.filter_values.iter()))
    }

    pub fn batch_limits(&self) -> BatchLimits {
        let limits = BatchLimits::records(self.batch_size);
        match self.batch_bytes {
            Some(bytes) if bytes > 0 => limits.with_max_bytes(bytes as usize),
            _ => limits,
        }
    }

    pub fn pacing(&self) -> Pacing {
        match (self.delay, self.rate) {
            (Some(delay), _) => Pacing::from_delay(delay),
            (None, Some(rate)) => Pacing::from_rate(rate),
            (None, None) => Pacing::Unpaced,
        }
    }

    /// Decision event destination, `None` when disabled.
    pub fn diag_target(&self) -> Option<DiagTarget> {
        match self.diag.as_deref() {
            None | Some("") | Some("none") => None,
            Some(target) => target.parse().ok(),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            ordering: self.ordering_config(),
            filter: self.inclusion_filter(),
            batch: self.batch_limits(),
            pacing: self.pacing(),
            looping: self.looping,
        }
    }
}

/// File-to-file cleaning configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub delimiter: String,
    pub ts_col: usize,
    pub key_cols: Vec<usize>,
    /// Header copied to the output verbatim
    pub skip_header: bool,
    pub drop_equal: bool,
    /// `per-key` or `global`
    pub order_scope: OrderScope,
    pub repair_increment: f64,
    pub nudge_increment: f64,
}

impl CleanConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            delimiter: ",".to_string(),
            ts_col: 0,
            key_cols: vec![1],
            skip_header: false,
            drop_equal: false,
            order_scope: OrderScope::PerKey,
            repair_increment: 0.0,
            nudge_increment: 0.0,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        parse_delimiter(&self.delimiter)?;
        check_number("repair_increment", self.repair_increment)?;
        check_number("nudge_increment", self.nudge_increment)?;

        match self.order_scope {
            OrderScope::PerKey | OrderScope::Global => {}
            other => return Err(ConfigError::UnsupportedScope(other.as_str())),
        }
        if self.order_scope.uses_keys() && self.key_cols.is_empty() {
            return Err(ConfigError::MissingKeyColumns(self.order_scope.as_str()));
        }

        Ok(())
    }

    pub fn delimiter_char(&self) -> char {
        parse_delimiter(&self.delimiter).unwrap_or(',')
    }

    /// Cleaning always drops records it cannot order.
    pub fn ordering_config(&self) -> OrderingConfig {
        OrderingConfig::with_scope(self.order_scope)
            .ts_col(self.ts_col)
            .key_cols(self.key_cols.clone())
            .drop_equal(self.drop_equal)
            .repair(self.repair_increment)
            .nudge(self.nudge_increment)
            .unparsable(UnparsablePolicy::Drop)
    }
}

fn parse_delimiter(value: &str) -> ConfigResult<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '\n' && c != '\r' => Ok(c),
        _ => Err(ConfigError::InvalidDelimiter(value.to_string())),
    }
}

fn check_number(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidNumber { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn valid() -> ReplayConfig {
        ReplayConfig {
            source: Some(PathBuf::from("data.csv")),
            ..ReplayConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = valid();
        config.validate().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 32323);
        assert_eq!(config.pacing(), Pacing::Unpaced);
        assert_eq!(config.batch_limits(), BatchLimits::records(1));
        assert!(config.diag_target().is_none());
    }

    #[test]
    fn test_missing_source_rejected() {
        assert!(matches!(
            ReplayConfig::default().validate(),
            Err(ConfigError::MissingSource)
        ));
    }

    #[test]
    fn test_conflicting_pacing_rejected() {
        let config = ReplayConfig {
            delay: Some(0.1),
            rate: Some(10.0),
            ..valid()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ConflictingPacing)));
    }

    #[test]
    fn test_negative_and_nan_numbers_rejected() {
        let negative = ReplayConfig {
            repair_increment: -1.0,
            ..valid()
        };
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::InvalidNumber { name: "repair_increment", .. })
        ));

        let nan = ReplayConfig {
            delay: Some(f64::NAN),
            ..valid()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_oversized_pacing_rejected() {
        let slow_delay = ReplayConfig {
            delay: Some(1e20),
            ..valid()
        };
        assert!(matches!(
            slow_delay.validate(),
            Err(ConfigError::PacingOutOfRange { name: "delay", .. })
        ));

        let slow_rate = ReplayConfig {
            rate: Some(1e-20),
            ..valid()
        };
        assert!(matches!(
            slow_rate.validate(),
            Err(ConfigError::PacingOutOfRange { name: "rate", .. })
        ));

        // Building settings never panics, even without validation.
        assert_eq!(slow_rate.session_settings().pacing, Pacing::PerRecord(Duration::MAX));
        assert_eq!(slow_delay.pacing(), Pacing::PerRecord(Duration::MAX));
    }

    #[test]
    fn test_per_key_requires_keys() {
        let config = ReplayConfig {
            order_scope: OrderScope::Both,
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingKeyColumns("both"))
        ));
    }

    #[test]
    fn test_delimiter_must_be_one_char() {
        for bad in ["", ";;", "\n"] {
            let config = ReplayConfig {
                delimiter: bad.to_string(),
                ..valid()
            };
            assert!(matches!(config.validate(), Err(ConfigError::InvalidDelimiter(_))));
        }

        let tab = ReplayConfig {
            delimiter: "\t".to_string(),
            ..valid()
        };
        tab.validate().unwrap();
        assert_eq!(tab.delimiter_char(), '\t');
    }

    #[test]
    fn test_filter_halves_rejected() {
        let column_only = ReplayConfig {
            filter_col: Some(2),
            ..valid()
        };
        assert!(matches!(column_only.validate(), Err(ConfigError::IncompleteFilter)));

        let values_only = ReplayConfig {
            filter_values: vec!["a".into()],
            ..valid()
        };
        assert!(matches!(values_only.validate(), Err(ConfigError::IncompleteFilter)));
    }

    #[test]
    fn test_batch_limits() {
        let zero = ReplayConfig {
            batch_size: 0,
            ..valid()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroBatchSize)));

        let negative = ReplayConfig {
            batch_bytes: Some(-5),
            ..valid()
        };
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::NegativeBatchBytes(-5))
        ));

        let bounded = ReplayConfig {
            batch_size: 10,
            batch_bytes: Some(512),
            ..valid()
        };
        assert_eq!(bounded.batch_limits(), BatchLimits::records(10).with_max_bytes(512));

        let unbounded = ReplayConfig {
            batch_bytes: Some(0),
            ..valid()
        };
        assert_eq!(unbounded.batch_limits().max_bytes, None);
    }

    #[test]
    fn test_samples_need_sink() {
        let config = ReplayConfig {
            diag_samples: Some(5),
            diag: Some("none".into()),
            ..valid()
        };
        assert!(matches!(config.validate(), Err(ConfigError::SamplesWithoutSink)));

        let config = ReplayConfig {
            diag_samples: Some(5),
            diag: Some("stderr".into()),
            ..valid()
        };
        config.validate().unwrap();
        assert_eq!(config.diag_target(), Some(DiagTarget::Stderr));
    }

    #[test]
    fn test_load_json_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("replay.json");
        fs::write(
            &path,
            r#"{"source": "ticks.csv", "loop": true, "order_scope": "per-key", "key_cols": [1], "rate": 50.0}"#,
        )
        .unwrap();

        let config = ReplayConfig::load(&path).unwrap();
        config.validate().unwrap();

        assert!(config.looping);
        assert_eq!(config.order_scope, OrderScope::PerKey);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.pacing(), Pacing::from_rate(50.0));
        assert_eq!(config.ordering_config().key_cols, vec![1]);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("replay.json");
        fs::write(&path, r#"{"sauce": "ticks.csv"}"#).unwrap();

        assert!(matches!(ReplayConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_clean_defaults_and_scope() {
        let config = CleanConfig::new("in.csv", "out.csv");
        config.validate().unwrap();
        assert_eq!(config.key_cols, vec![1]);
        assert_eq!(config.ordering_config().unparsable, UnparsablePolicy::Drop);

        let both = CleanConfig {
            order_scope: OrderScope::Both,
            ..config.clone()
        };
        assert!(matches!(both.validate(), Err(ConfigError::UnsupportedScope("both"))));

        let global = CleanConfig {
            order_scope: OrderScope::Global,
            key_cols: Vec::new(),
            ..config
        };
        global.validate().unwrap();
    }
}
