//! Lifecycle events
//!
//! Every lifecycle log line carries one of these as its `event` field.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Startup
    /// Configuration validated
    ConfigLoaded,
    /// Source read into memory
    SourcePreloaded,
    /// Listening for connections
    ServerListening,

    // Sessions
    /// Consumer connected
    ClientConnected,
    /// Consumer gone or session finished
    ClientDisconnected,
    /// Replay pass started
    PassBegin,
    /// Replay pass finished
    PassComplete,
    /// Looping pass forwarded nothing; session ends
    PassEmpty,
    /// Session aborted by a non-disconnect error
    SessionFailed,
    /// Accepting a connection failed
    AcceptFailed,

    // Shutdown
    /// Operator interrupt received
    ShutdownRequested,
    /// Accept loop exited
    ShutdownComplete,

    // Cleaning
    /// File-to-file cleaning finished
    CleanComplete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SourcePreloaded => "SOURCE_PRELOADED",
            Event::ServerListening => "SERVER_LISTENING",
            Event::ClientConnected => "CLIENT_CONNECTED",
            Event::ClientDisconnected => "CLIENT_DISCONNECTED",
            Event::PassBegin => "PASS_BEGIN",
            Event::PassComplete => "PASS_COMPLETE",
            Event::PassEmpty => "PASS_EMPTY",
            Event::SessionFailed => "SESSION_FAILED",
            Event::AcceptFailed => "ACCEPT_FAILED",
            Event::ShutdownRequested => "SHUTDOWN_REQUESTED",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::CleanComplete => "CLEAN_COMPLETE",
        }
    }

    /// Default severity of the event.
    pub fn severity(&self) -> Severity {
        match self {
            Event::PassBegin => Severity::Trace,
            Event::PassEmpty | Event::AcceptFailed => Severity::Warn,
            Event::SessionFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake() {
        let events = [
            Event::ConfigLoaded,
            Event::SourcePreloaded,
            Event::ServerListening,
            Event::ClientConnected,
            Event::ClientDisconnected,
            Event::PassBegin,
            Event::PassComplete,
            Event::PassEmpty,
            Event::SessionFailed,
            Event::AcceptFailed,
            Event::ShutdownRequested,
            Event::ShutdownComplete,
            Event::CleanComplete,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_severities() {
        assert_eq!(Event::SessionFailed.severity(), Severity::Error);
        assert_eq!(Event::PassEmpty.severity(), Severity::Warn);
        assert_eq!(Event::ClientConnected.severity(), Severity::Info);
    }
}
