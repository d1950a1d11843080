//! CLI command implementations
//!
//! serve:
//! 1. Load config file (if any), apply flags, validate
//! 2. Open the record source (preloading it if configured)
//! 3. Install the Ctrl-C watcher
//! 4. Open the decision sink
//! 5. Bind and run the accept loop until shutdown
//!
//! clean:
//! 1. Validate
//! 2. Clean input into output
//! 3. Print the report as one JSON line

use std::io::{self, Write};

use super::args::{CleanArgs, Command, ServeArgs};
use super::errors::{CliError, CliResult};
use crate::clean::{clean_file, CleanReport};
use crate::config::ReplayConfig;
use crate::observability::{Event, JsonLinesSink, Logger};
use crate::ordering::{DecisionSink, NullSink};
use crate::server::ReplayServer;
use crate::shutdown::ShutdownSignal;
use crate::source::RecordSource;

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve(args) => serve(args),
        Command::Clean(args) => clean(args).map(|_| ()),
    }
}

/// Builds the effective serve configuration: file values, then flags.
pub fn resolve_config(mut args: ServeArgs) -> CliResult<ReplayConfig> {
    let mut config = match args.config.take() {
        Some(path) => ReplayConfig::load(&path)?,
        None => ReplayConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Runs the replay server until Ctrl-C.
pub fn serve(args: ServeArgs) -> CliResult<()> {
    let config = resolve_config(args)?;
    let source_path = config
        .source
        .clone()
        .ok_or_else(|| CliError::config_invalid("source file is required"))?;

    let scope = config.order_scope.as_str();
    let path_str = source_path.display().to_string();
    Logger::event(
        Event::ConfigLoaded,
        &[
            ("source", &path_str),
            ("order_scope", scope),
            ("loop", bool_str(config.looping)),
            ("preload", bool_str(config.preload)),
        ],
    );

    let source = RecordSource::open(&source_path, config.source_options())?;
    if let (Some(checksum), Some(lines)) = (source.snapshot_checksum(), source.snapshot_len()) {
        let checksum = format!("{:08x}", checksum);
        let lines = lines.to_string();
        Logger::event(
            Event::SourcePreloaded,
            &[("source", &path_str), ("crc32", &checksum), ("lines", &lines)],
        );
    }

    let shutdown = ShutdownSignal::new();
    shutdown.install_ctrl_c()?;

    let mut sink: Box<dyn DecisionSink> = match config.diag_target() {
        Some(target) => Box::new(
            JsonLinesSink::open(&target, config.diag_samples)
                .map_err(|e| CliError::config_invalid(format!("Failed to open diag sink: {}", e)))?,
        ),
        None => Box::new(NullSink),
    };

    let server = ReplayServer::bind(
        &config.host,
        config.port,
        source,
        config.session_settings(),
        shutdown,
    )
    .map_err(|e| {
        CliError::transport(format!(
            "Failed to bind {}:{}: {}",
            config.host, config.port, e
        ))
    })?;

    server.serve(sink.as_mut())?;
    Ok(())
}

/// Cleans a file and prints the report to stdout.
pub fn clean(args: CleanArgs) -> CliResult<CleanReport> {
    let config = args.into_config();
    config.validate()?;

    let report = clean_file(&config, &mut NullSink)?;

    let input = config.input.display().to_string();
    let output = config.output.display().to_string();
    let kept = report.kept.to_string();
    let dropped = report.dropped().to_string();
    Logger::event(
        Event::CleanComplete,
        &[
            ("input", &input),
            ("output", &output),
            ("kept", &kept),
            ("dropped", &dropped),
        ],
    );

    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, &report)
        .map_err(|e| CliError::transport(format!("Failed to write report: {}", e)))?;
    writeln!(stdout)?;

    Ok(report)
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
