//! Structured decision events
//!
//! The engine reports every drop, repair and nudge to a caller-supplied
//! [`DecisionSink`]. It never owns or buffers the sink.

use std::fmt;

use serde::Serialize;

use super::CheckScope;

/// Kind of a reportable per-record decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Rejected by the inclusion filter
    Filtered,
    /// Timestamp rewritten to previous + repair increment
    Repaired,
    /// Exact tie rewritten to previous + nudge increment
    Nudged,
    /// Timestamp not increasing for a scope
    DroppedNonIncreasing,
    /// Timestamp could not be normalized
    DroppedUnparsable,
    /// Timestamp column beyond the field count
    DroppedIndexError,
    /// Unparsable timestamp forwarded without checks
    ForwardedUnparsable,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Filtered => "filtered",
            DecisionKind::Repaired => "repaired",
            DecisionKind::Nudged => "nudged",
            DecisionKind::DroppedNonIncreasing => "dropped_non_increasing",
            DecisionKind::DroppedUnparsable => "dropped_unparsable",
            DecisionKind::DroppedIndexError => "dropped_index_error",
            DecisionKind::ForwardedUnparsable => "forwarded_unparsable",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reportable decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionEvent {
    pub kind: DecisionKind,
    /// Source line number of the record.
    pub line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<CheckScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<String>>,
    /// Field value as read (timestamp field, or filter field for `Filtered`).
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten: Option<String>,
}

impl DecisionEvent {
    pub fn new(kind: DecisionKind, line: u64, original: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            scope: None,
            key: None,
            original: original.into(),
            rewritten: None,
        }
    }

    pub fn with_scope(mut self, scope: CheckScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_key(mut self, key: Option<&[String]>) -> Self {
        self.key = key.map(<[String]>::to_vec);
        self
    }

    pub fn with_rewritten(mut self, value: impl Into<String>) -> Self {
        self.rewritten = Some(value.into());
        self
    }
}

/// Destination for decision events.
pub trait DecisionSink {
    /// Receives one event. Must not fail the pipeline.
    fn emit(&mut self, event: DecisionEvent);

    /// A new connection's session starts.
    fn begin_session(&mut self, _session: &str) {}

    /// A new pass (1-based within the session) starts.
    fn begin_pass(&mut self, _pass: u64) {}
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DecisionSink for NullSink {
    fn emit(&mut self, _event: DecisionEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Vec<DecisionEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[DecisionEvent] {
        &self.events
    }

    /// Events of one kind, in arrival order.
    pub fn of_kind(&self, kind: DecisionKind) -> Vec<&DecisionEvent> {
        self.events.iter().filter(|e| e.kind == kind).collect()
    }
}

impl DecisionSink for CollectingSink {
    fn emit(&mut self, event: DecisionEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_without_empty_optionals() {
        let event = DecisionEvent::new(DecisionKind::DroppedUnparsable, 4, "abc");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "dropped_unparsable");
        assert_eq!(json["line"], 4);
        assert_eq!(json["original"], "abc");
        assert!(json.get("scope").is_none());
        assert!(json.get("rewritten").is_none());
    }

    #[test]
    fn test_event_with_scope_and_rewrite() {
        let key = vec!["dev1".to_string()];
        let event = DecisionEvent::new(DecisionKind::Repaired, 9, "100")
            .with_scope(CheckScope::PerKey)
            .with_key(Some(&key))
            .with_rewritten("101");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["scope"], "per-key");
        assert_eq!(json["key"][0], "dev1");
        assert_eq!(json["rewritten"], "101");
    }

    #[test]
    fn test_collecting_sink_filters_by_kind() {
        let mut sink = CollectingSink::new();
        sink.emit(DecisionEvent::new(DecisionKind::Filtered, 1, "x"));
        sink.emit(DecisionEvent::new(DecisionKind::Nudged, 2, "5"));
        sink.emit(DecisionEvent::new(DecisionKind::Filtered, 3, "y"));

        assert_eq!(sink.of_kind(DecisionKind::Filtered).len(), 2);
        assert_eq!(sink.of_kind(DecisionKind::Nudged)[0].line, 2);
    }
}
