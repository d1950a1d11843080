//! Observability
//!
//! - Structured JSON lifecycle logging ([`Logger`], [`Event`])
//! - Decision event sinks writing JSON lines ([`JsonLinesSink`])
//!
//! Observability never fails the replay: write errors are swallowed.
//!
//! ```ignore
//! use tsreplay::observability::{Event, Logger};
//!
//! Logger::event(Event::ClientConnected, &[("peer", "127.0.0.1:50000")]);
//! ```

mod events;
mod logger;
mod sink;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use sink::{DiagTarget, JsonLinesSink};
