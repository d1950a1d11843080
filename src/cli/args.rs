//! CLI argument definitions using clap
//!
//! Commands:
//! - tsreplay serve <csv_path> [--config <path>] [flags]
//! - tsreplay clean --input <path> --output <path> [flags]
//!
//! `serve` flags are all optional so that values from `--config` are only
//! replaced by flags the operator actually passed.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{CleanConfig, ReplayConfig};
use crate::ordering::{OrderScope, UnparsablePolicy};

/// tsreplay - replay timestamped delimited records over TCP
#[derive(Parser, Debug)]
#[command(name = "tsreplay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve a delimited file to one TCP consumer at a time
    Serve(ServeArgs),

    /// Write a monotonic copy of a delimited file
    Clean(CleanArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// File to replay
    pub csv_path: Option<PathBuf>,

    /// JSON config file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bind address [default: 127.0.0.1]
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port [default: 32323]
    #[arg(long)]
    pub port: Option<u16>,

    /// Seconds to wait per record
    #[arg(long, conflicts_with = "rate")]
    pub delay: Option<f64>,

    /// Target records per second
    #[arg(long)]
    pub rate: Option<f64>,

    /// Restart from the top when the file ends
    #[arg(long = "loop")]
    pub looping: bool,

    /// Read the file into memory once
    #[arg(long)]
    pub preload: bool,

    /// Treat the first line as a header and skip it
    #[arg(long)]
    pub skip_header: bool,

    /// Single-character field delimiter [default: ,]
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Timestamp column index [default: 0]
    #[arg(long)]
    pub ts_col: Option<usize>,

    /// Key column index (repeatable)
    #[arg(long = "key-col")]
    pub key_cols: Vec<usize>,

    /// Ordering scope [default: disabled]
    #[arg(long, value_enum)]
    pub order_scope: Option<OrderScope>,

    /// Drop records whose timestamp equals the previous one
    #[arg(long)]
    pub drop_equal: bool,

    /// Rewrite non-increasing timestamps to previous + N seconds
    #[arg(long)]
    pub repair_increment: Option<f64>,

    /// Rewrite exact ties to previous + N seconds
    #[arg(long)]
    pub nudge_increment: Option<f64>,

    /// Records with unparsable timestamps [default: forward]
    #[arg(long, value_enum)]
    pub unparsable: Option<UnparsablePolicy>,

    /// Column checked by the inclusion filter
    #[arg(long)]
    pub filter_col: Option<usize>,

    /// Allowed filter value (repeatable)
    #[arg(long = "filter-value")]
    pub filter_values: Vec<String>,

    /// Records per write [default: 1]
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Flush once a batch reaches this many bytes (0 = no limit)
    #[arg(long, allow_hyphen_values = true)]
    pub batch_bytes: Option<i64>,

    /// Decision event sink: none, stdout, stderr or a file path
    #[arg(long)]
    pub diag: Option<String>,

    /// Decision events written per kind per pass (0 = all)
    #[arg(long)]
    pub diag_samples: Option<u64>,
}

impl ServeArgs {
    /// Overrides `config` with every flag that was given.
    pub fn apply(self, config: &mut ReplayConfig) {
        if let Some(path) = self.csv_path {
            config.source = Some(path);
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(delay) = self.delay {
            config.delay = Some(delay);
            config.rate = None;
        }
        if let Some(rate) = self.rate {
            config.rate = Some(rate);
            config.delay = None;
        }
        config.looping |= self.looping;
        config.preload |= self.preload;
        config.skip_header |= self.skip_header;
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(ts_col) = self.ts_col {
            config.ts_col = ts_col;
        }
        if !self.key_cols.is_empty() {
            config.key_cols = self.key_cols;
        }
        if let Some(scope) = self.order_scope {
            config.order_scope = scope;
        }
        config.drop_equal |= self.drop_equal;
        if let Some(repair) = self.repair_increment {
            config.repair_increment = repair;
        }
        if let Some(nudge) = self.nudge_increment {
            config.nudge_increment = nudge;
        }
        if let Some(policy) = self.unparsable {
            config.unparsable = policy;
        }
        if let Some(col) = self.filter_col {
            config.filter_col = Some(col);
        }
        if !self.filter_values.is_empty() {
            config.filter_values = self.filter_values;
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        if let Some(bytes) = self.batch_bytes {
            config.batch_bytes = Some(bytes);
        }
        if let Some(diag) = self.diag {
            config.diag = Some(diag);
        }
        if let Some(samples) = self.diag_samples {
            config.diag_samples = Some(samples);
        }
    }
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// File to clean
    #[arg(long)]
    pub input: PathBuf,

    /// Cleaned file (parent directories are created)
    #[arg(long)]
    pub output: PathBuf,

    /// Single-character field delimiter
    #[arg(long, default_value = ",")]
    pub delimiter: String,

    /// Timestamp column index
    #[arg(long, default_value_t = 0)]
    pub ts_col: usize,

    /// Key column index (repeatable) [default: 1]
    #[arg(long = "key-col")]
    pub key_cols: Vec<usize>,

    /// Copy the first line to the output unchanged
    #[arg(long)]
    pub skip_header: bool,

    /// Drop records whose timestamp equals the previous one
    #[arg(long)]
    pub drop_equal: bool,

    /// Ordering scope: per-key or global
    #[arg(long, value_enum, default_value_t = OrderScope::PerKey)]
    pub order_scope: OrderScope,

    /// Rewrite non-increasing timestamps to previous + N seconds
    #[arg(long, default_value_t = 0.0)]
    pub repair_increment: f64,

    /// Rewrite exact ties to previous + N seconds
    #[arg(long, default_value_t = 0.0)]
    pub nudge_increment: f64,
}

impl CleanArgs {
    pub fn into_config(self) -> CleanConfig {
        let mut config = CleanConfig::new(self.input, self.output);
        config.delimiter = self.delimiter;
        config.ts_col = self.ts_col;
        if !self.key_cols.is_empty() {
            config.key_cols = self.key_cols;
        }
        config.skip_header = self.skip_header;
        config.drop_equal = self.drop_equal;
        config.order_scope = self.order_scope;
        config.repair_increment = self.repair_increment;
        config.nudge_increment = self.nudge_increment;
        config
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
