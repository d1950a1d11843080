//! Decision event sinks backed by a writer
//!
//! One JSON object per line. An optional sample count bounds how many
//! events of each kind are written per pass; the rest are only counted.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::ordering::{DecisionEvent, DecisionKind, DecisionSink};

/// Where decision events are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagTarget {
    Stdout,
    Stderr,
    /// Append-only file, created if missing
    File(PathBuf),
}

impl FromStr for DiagTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "stdout" | "-" => DiagTarget::Stdout,
            "stderr" => DiagTarget::Stderr,
            path => DiagTarget::File(PathBuf::from(path)),
        })
    }
}

#[derive(Serialize)]
struct Line<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a str>,
    pass: u64,
    #[serde(flatten)]
    event: &'a DecisionEvent,
}

/// Writes decision events as JSON lines.
pub struct JsonLinesSink {
    writer: Box<dyn Write + Send>,
    samples: Option<u64>,
    written: HashMap<DecisionKind, u64>,
    suppressed: u64,
    session: Option<String>,
    pass: u64,
}

impl JsonLinesSink {
    /// `samples` of `None` or `Some(0)` writes every event.
    pub fn new(writer: Box<dyn Write + Send>, samples: Option<u64>) -> Self {
        Self {
            writer,
            samples: samples.filter(|&n| n > 0),
            written: HashMap::new(),
            suppressed: 0,
            session: None,
            pass: 0,
        }
    }

    pub fn open(target: &DiagTarget, samples: Option<u64>) -> io::Result<Self> {
        let writer: Box<dyn Write + Send> = match target {
            DiagTarget::Stdout => Box::new(io::stdout()),
            DiagTarget::Stderr => Box::new(io::stderr()),
            DiagTarget::File(path) => Box::new(
                OpenOptions::new().create(true).append(true).open(path)?,
            ),
        };
        Ok(Self::new(writer, samples))
    }

    /// Events counted but not written since the last pass began.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}

impl DecisionSink for JsonLinesSink {
    fn begin_session(&mut self, session: &str) {
        self.session = Some(session.to_string());
    }

    fn begin_pass(&mut self, pass: u64) {
        self.pass = pass;
        self.written.clear();
        self.suppressed = 0;
    }

    fn emit(&mut self, event: DecisionEvent) {
        let count = self.written.entry(event.kind).or_insert(0);
        if let Some(limit) = self.samples {
            if *count >= limit {
                self.suppressed += 1;
                return;
            }
        }
        *count += 1;

        let line = Line {
            session: self.session.as_deref(),
            pass: self.pass,
            event: &event,
        };
        if let Ok(mut json) = serde_json::to_vec(&line) {
            json.push(b'\n');
            let _ = self.writer.write_all(&json);
            let _ = self.writer.flush();
        }
    }
}
