//! CLI module for tsreplay
//!
//! Provides command-line interface for:
//! - serve: replay a delimited file to TCP consumers
//! - clean: write a monotonic copy of a delimited file

mod args;
mod commands;
mod errors;

pub use args::{CleanArgs, Cli, Command, ServeArgs};
pub use commands::{clean, resolve_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
