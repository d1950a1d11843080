//! Ordering & repair engine
//!
//! Decides, for every candidate record, whether it is forwarded as-is,
//! forwarded with a rewritten timestamp, or dropped, so that emitted event
//! time is monotonic per scope.
//!
//! # Invariants
//!
//! - Within one pass, the last accepted instant of any scope never decreases.
//! - Repair and nudge always produce `previous + increment` with a positive
//!   increment, so a rewritten record is strictly newer than the last one.
//! - Dropped records never touch ordering state.
//! - With [`OrderScope::Disabled`] the engine is a pass-through.
//!
//! # Both scopes
//!
//! With [`OrderScope::Both`] the per-key check runs first and the global
//! check sees its result, so a per-key repair or nudge is what the global
//! check compares. Neither the per-key nor the global instant is written
//! until both checks pass: a record the global check drops leaves its key's
//! last instant unchanged.

mod engine;
mod events;
mod state;

pub use engine::{Decision, DropReason, OrderingEngine, RewriteKind};
pub use events::{CollectingSink, DecisionEvent, DecisionKind, DecisionSink, NullSink};
pub use state::{Key, OrderingState};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Granularity at which monotonic event time is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OrderScope {
    /// No enforcement. Records pass through untouched.
    #[default]
    Disabled,
    /// One last-accepted instant for the whole stream.
    Global,
    /// One last-accepted instant per key.
    PerKey,
    /// Per-key check first, then the global check on the per-key result.
    Both,
}

impl OrderScope {
    /// True if any enforcement is active.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, OrderScope::Disabled)
    }

    /// True if per-key state is consulted.
    pub fn uses_keys(&self) -> bool {
        matches!(self, OrderScope::PerKey | OrderScope::Both)
    }

    /// True if global state is consulted.
    pub fn uses_global(&self) -> bool {
        matches!(self, OrderScope::Global | OrderScope::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderScope::Disabled => "disabled",
            OrderScope::Global => "global",
            OrderScope::PerKey => "per-key",
            OrderScope::Both => "both",
        }
    }
}

impl fmt::Display for OrderScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a record whose timestamp cannot be normalized
/// (including a timestamp column beyond the record's field count).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnparsablePolicy {
    /// Forward without any ordering check.
    #[default]
    Forward,
    /// Count and discard.
    Drop,
}

/// The scope a single check was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckScope {
    Global,
    PerKey,
}

impl CheckScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckScope::Global => "global",
            CheckScope::PerKey => "per-key",
        }
    }
}

/// Ordering & repair configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderingConfig {
    pub scope: OrderScope,
    /// Zero-based timestamp column.
    pub ts_col: usize,
    /// Zero-based key columns; required for per-key and both scopes.
    pub key_cols: Vec<usize>,
    /// Treat an exact tie with the last accepted instant as non-increasing.
    pub drop_equal: bool,
    /// Seconds added to the previous instant when repairing; 0 disables.
    pub repair_increment: f64,
    /// Seconds added to the previous instant on an exact tie; 0 disables.
    pub nudge_increment: f64,
    pub unparsable: UnparsablePolicy,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            scope: OrderScope::Disabled,
            ts_col: 0,
            key_cols: Vec::new(),
            drop_equal: false,
            repair_increment: 0.0,
            nudge_increment: 0.0,
            unparsable: UnparsablePolicy::Forward,
        }
    }
}

impl OrderingConfig {
    /// Enforcement over the given scope, everything else at defaults.
    pub fn with_scope(scope: OrderScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    pub fn ts_col(mut self, col: usize) -> Self {
        self.ts_col = col;
        self
    }

    pub fn key_cols(mut self, cols: Vec<usize>) -> Self {
        self.key_cols = cols;
        self
    }

    pub fn drop_equal(mut self, drop_equal: bool) -> Self {
        self.drop_equal = drop_equal;
        self
    }

    pub fn repair(mut self, seconds: f64) -> Self {
        self.repair_increment = seconds;
        self
    }

    pub fn nudge(mut self, seconds: f64) -> Self {
        self.nudge_increment = seconds;
        self
    }

    pub fn unparsable(mut self, policy: UnparsablePolicy) -> Self {
        self.unparsable = policy;
        self
    }
}
