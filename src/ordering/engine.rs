//! Per-record accept / rewrite / drop decisions

use crate::source::Record;
use crate::timestamp::{format_timestamp, parse_timestamp, Instant};

use super::events::{DecisionEvent, DecisionKind, DecisionSink};
use super::state::{Key, OrderingState};
use super::{CheckScope, OrderingConfig, UnparsablePolicy};

/// How a non-increasing timestamp was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteKind {
    /// `previous + repair_increment`
    Repair,
    /// `previous + nudge_increment`, exact ties only
    Nudge,
}

/// Why a record was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Not increasing relative to the given scope.
    NonIncreasing(CheckScope),
    /// Timestamp failed normalization.
    Unparsable,
    /// Timestamp column beyond the field count.
    IndexOutOfRange,
}

/// Outcome for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Forwarded unchanged.
    Accepted,
    /// Forwarded with its timestamp field rewritten.
    ///
    /// When both a per-key and a global rewrite happened, `kind` is
    /// `Repair` if either step repaired.
    Rewritten {
        kind: RewriteKind,
        from: Instant,
        to: Instant,
    },
    /// Forwarded without checks because the timestamp was unusable.
    ForwardedUnparsable,
    /// Not forwarded.
    Dropped(DropReason),
}

impl Decision {
    /// True if the record goes to the output.
    pub fn is_forwarded(&self) -> bool {
        !matches!(self, Decision::Dropped(_))
    }
}

enum Check {
    Pass,
    Rewrite(RewriteKind, Instant),
    Drop,
}

/// Applies an [`OrderingConfig`] to a stream of records.
///
/// Holds the ordering state for one session. Call [`OrderingEngine::reset`]
/// at the start of every pass.
#[derive(Debug)]
pub struct OrderingEngine {
    config: OrderingConfig,
    state: OrderingState,
}

impl OrderingEngine {
    pub fn new(config: OrderingConfig, state: OrderingState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &OrderingConfig {
        &self.config
    }

    pub fn state(&self) -> &OrderingState {
        &self.state
    }

    /// Returns ordering state to its initial (empty) value.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Decides the fate of `record`, rewriting its timestamp field in place
    /// when repaired or nudged.
    ///
    /// Per-key check runs first; a per-key rewrite feeds the global check.
    /// State is committed only when the record is accepted.
    pub fn process(&mut self, record: &mut Record, sink: &mut dyn DecisionSink) -> Decision {
        if !self.config.scope.is_enabled() {
            return Decision::Accepted;
        }

        let raw = match record.field(self.config.ts_col) {
            Some(raw) => raw.into_owned(),
            None => return self.unparsable(record, DropReason::IndexOutOfRange, String::new(), sink),
        };

        let parsed = match parse_timestamp(&raw) {
            Some(parsed) => parsed,
            None => return self.unparsable(record, DropReason::Unparsable, raw, sink),
        };

        let key = if self.config.scope.uses_keys() {
            Some(Key::extract(record, &self.config.key_cols))
        } else {
            None
        };

        let mut current = parsed.instant;
        let mut current_text = raw;
        let mut rewrite: Option<RewriteKind> = None;

        let mut checks = Vec::with_capacity(2);
        if let Some(key) = &key {
            checks.push((CheckScope::PerKey, self.state.last_for(key)));
        }
        if self.config.scope.uses_global() {
            checks.push((CheckScope::Global, self.state.last_global()));
        }

        let key_values = key.as_ref().map(Key::values);
        for (scope, previous) in checks {
            match self.check(previous, current) {
                Check::Pass => {}
                Check::Rewrite(kind, to) => {
                    let text = format_timestamp(to, &parsed.format);
                    let event_kind = match kind {
                        RewriteKind::Repair => DecisionKind::Repaired,
                        RewriteKind::Nudge => DecisionKind::Nudged,
                    };
                    sink.emit(
                        DecisionEvent::new(event_kind, record.line_no(), current_text)
                            .with_scope(scope)
                            .with_key(key_values)
                            .with_rewritten(text.clone()),
                    );
                    current = to;
                    current_text = text;
                    rewrite = match (rewrite, kind) {
                        (Some(RewriteKind::Repair), _) => Some(RewriteKind::Repair),
                        (_, kind) => Some(kind),
                    };
                }
                Check::Drop => {
                    sink.emit(
                        DecisionEvent::new(
                            DecisionKind::DroppedNonIncreasing,
                            record.line_no(),
                            current_text,
                        )
                        .with_scope(scope)
                        .with_key(key_values),
                    );
                    return Decision::Dropped(DropReason::NonIncreasing(scope));
                }
            }
        }

        if self.config.scope.uses_global() {
            self.state.accept_global(current);
        }
        if let Some(key) = key {
            self.state.accept_key(key, current);
        }

        match rewrite {
            Some(kind) => {
                record.set_field(self.config.ts_col, current_text);
                Decision::Rewritten {
                    kind,
                    from: parsed.instant,
                    to: current,
                }
            }
            None => Decision::Accepted,
        }
    }

    fn check(&self, previous: Option<Instant>, incoming: Instant) -> Check {
        let previous = match previous {
            Some(previous) => previous,
            None => return Check::Pass,
        };

        if incoming > previous {
            return Check::Pass;
        }

        if self.config.repair_increment > 0.0 {
            return Check::Rewrite(
                RewriteKind::Repair,
                previous.plus_seconds(self.config.repair_increment),
            );
        }

        if incoming == previous {
            if self.config.nudge_increment > 0.0 {
                return Check::Rewrite(
                    RewriteKind::Nudge,
                    previous.plus_seconds(self.config.nudge_increment),
                );
            }
            if !self.config.drop_equal {
                return Check::Pass;
            }
        }

        Check::Drop
    }

    fn unparsable(
        &self,
        record: &Record,
        reason: DropReason,
        raw: String,
        sink: &mut dyn DecisionSink,
    ) -> Decision {
        match self.config.unparsable {
            UnparsablePolicy::Forward => {
                sink.emit(DecisionEvent::new(
                    DecisionKind::ForwardedUnparsable,
                    record.line_no(),
                    raw,
                ));
                Decision::ForwardedUnparsable
            }
            UnparsablePolicy::Drop => {
                let kind = match reason {
                    DropReason::IndexOutOfRange => DecisionKind::DroppedIndexError,
                    _ => DecisionKind::DroppedUnparsable,
                };
                sink.emit(DecisionEvent::new(kind, record.line_no(), raw));
                Decision::Dropped(reason)
            }
        }
    }
}
