//! File-to-file cleaning
//!
//! Runs every record of the input through the ordering engine with the
//! drop-unparsable policy and writes the accepted records, in source order,
//! to the output file. With `skip_header` the header line is copied to the
//! output byte for byte, terminator included. Record lines keep their bytes
//! and end in `\n`. Rewritten timestamps (repair/nudge) are written in
//! their rewritten form.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::CleanConfig;
use crate::ordering::{
    Decision, DecisionSink, DropReason, OrderingEngine, OrderingState, RewriteKind,
};
use crate::source::{RecordSource, SourceError, SourceMode, SourceOptions};

/// Cleaning error
#[derive(Debug, Error)]
pub enum CleanError {
    /// Input missing or unreadable
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Output could not be created or written
    #[error("Failed to write output {}: {source}", .path.display())]
    Output { path: PathBuf, source: io::Error },
}

impl CleanError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            CleanError::Source(e) => e.code().code(),
            CleanError::Output { .. } => "REPLAY_OUTPUT_FAILED",
        }
    }

    fn output(path: &Path, source: io::Error) -> Self {
        CleanError::Output {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Counts for one cleaning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    /// Records read (header excluded)
    pub total: u64,
    /// Records written
    pub kept: u64,
    pub repaired: u64,
    pub nudged: u64,
    pub dropped_non_increasing: u64,
    pub dropped_unparsable: u64,
    pub dropped_index_error: u64,
}

impl CleanReport {
    fn record(&mut self, decision: &Decision) {
        match decision {
            Decision::Accepted | Decision::ForwardedUnparsable => self.kept += 1,
            Decision::Rewritten { kind, .. } => {
                self.kept += 1;
                match kind {
                    RewriteKind::Repair => self.repaired += 1,
                    RewriteKind::Nudge => self.nudged += 1,
                }
            }
            Decision::Dropped(DropReason::NonIncreasing(_)) => self.dropped_non_increasing += 1,
            Decision::Dropped(DropReason::Unparsable) => self.dropped_unparsable += 1,
            Decision::Dropped(DropReason::IndexOutOfRange) => self.dropped_index_error += 1,
        }
    }

    /// All dropped records.
    pub fn dropped(&self) -> u64 {
        self.dropped_non_increasing + self.dropped_unparsable + self.dropped_index_error
    }
}

/// Cleans `config.input` into `config.output`, creating the output's
/// parent directories. `config` must already be validated.
pub fn clean_file(
    config: &CleanConfig,
    sink: &mut dyn DecisionSink,
) -> Result<CleanReport, CleanError> {
    let options = SourceOptions {
        delimiter: config.delimiter_char(),
        skip_header: config.skip_header,
        mode: SourceMode::Streaming,
    };
    let source = RecordSource::open(&config.input, options)?;
    let mut pass = source.pass()?;

    let output = &config.output;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CleanError::output(output, e))?;
    }
    let file = File::create(output).map_err(|e| CleanError::output(output, e))?;
    let mut writer = BufWriter::new(file);

    if let Some(header) = pass.take_header()? {
        writer
            .write_all(header)
            .map_err(|e| CleanError::output(output, e))?;
    }

    let mut engine = OrderingEngine::new(config.ordering_config(), OrderingState::new());
    let mut report = CleanReport::default();
    let mut line = Vec::new();

    for item in pass {
        let mut record = item?;
        report.total += 1;

        let decision = engine.process(&mut record, sink);
        report.record(&decision);
        if !decision.is_forwarded() {
            continue;
        }

        line.clear();
        record.encode_into(&mut line);
        writer
            .write_all(&line)
            .map_err(|e| CleanError::output(output, e))?;
    }

    writer.flush().map_err(|e| CleanError::output(output, e))?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::{NullSink, OrderScope};
    use tempfile::TempDir;

    #[test]
    fn test_per_key_cleaning_keeps_header() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("nested/out/clean.csv");
        fs::write(&input, "ts,dev\n10,a\n5,b\n9,a\nbad,a\n11,a\n").unwrap();

        let config = CleanConfig {
            skip_header: true,
            ..CleanConfig::new(&input, &output)
        };
        let report = clean_file(&config, &mut NullSink).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "ts,dev\n10,a\n5,b\n11,a\n"
        );
        assert_eq!(report.total, 5);
        assert_eq!(report.kept, 3);
        assert_eq!(report.dropped_non_increasing, 1);
        assert_eq!(report.dropped_unparsable, 1);
    }

    #[test]
    fn test_global_with_drop_equal() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "10\n10\n12\n11\n15\n").unwrap();

        let config = CleanConfig {
            order_scope: OrderScope::Global,
            drop_equal: true,
            ..CleanConfig::new(&input, &output)
        };
        let report = clean_file(&config, &mut NullSink).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "10\n12\n15\n");
        assert_eq!(report.dropped(), 2);
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let config = CleanConfig::new(dir.path().join("nope.csv"), dir.path().join("out.csv"));

        let err = clean_file(&config, &mut NullSink).unwrap_err();
        assert_eq!(err.code(), "REPLAY_SOURCE_NOT_FOUND");
        assert!(!dir.path().join("out.csv").exists());
    }
}
