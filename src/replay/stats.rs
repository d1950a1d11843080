//! Per-pass counters

use serde::Serialize;

use crate::ordering::{Decision, DropReason, RewriteKind};
use crate::pacer::FlushedBatch;

/// Counters for one pass. Reset at every pass start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Records read (header and empty lines excluded)
    pub total: u64,
    /// Records written to the output (including rewritten and unparsable-forwarded)
    pub forwarded: u64,
    pub filtered: u64,
    pub dropped_non_increasing: u64,
    pub dropped_unparsable: u64,
    pub dropped_index_error: u64,
    pub forwarded_unparsable: u64,
    pub repaired: u64,
    pub nudged: u64,
    pub batches: u64,
    pub bytes: u64,
}

impl PassStats {
    /// Counts one ordering decision.
    pub fn record_decision(&mut self, decision: &Decision) {
        match decision {
            Decision::Accepted => self.forwarded += 1,
            Decision::Rewritten { kind, .. } => {
                self.forwarded += 1;
                match kind {
                    RewriteKind::Repair => self.repaired += 1,
                    RewriteKind::Nudge => self.nudged += 1,
                }
            }
            Decision::ForwardedUnparsable => {
                self.forwarded += 1;
                self.forwarded_unparsable += 1;
            }
            Decision::Dropped(DropReason::NonIncreasing(_)) => self.dropped_non_increasing += 1,
            Decision::Dropped(DropReason::Unparsable) => self.dropped_unparsable += 1,
            Decision::Dropped(DropReason::IndexOutOfRange) => self.dropped_index_error += 1,
        }
    }

    pub fn record_batch(&mut self, batch: FlushedBatch) {
        self.batches += 1;
        self.bytes += batch.bytes as u64;
    }

    /// All drops by the ordering engine.
    pub fn dropped(&self) -> u64 {
        self.dropped_non_increasing + self.dropped_unparsable + self.dropped_index_error
    }

    /// Adds `other` into `self`.
    pub fn merge(&mut self, other: &PassStats) {
        self.total += other.total;
        self.forwarded += other.forwarded;
        self.filtered += other.filtered;
        self.dropped_non_increasing += other.dropped_non_increasing;
        self.dropped_unparsable += other.dropped_unparsable;
        self.dropped_index_error += other.dropped_index_error;
        self.forwarded_unparsable += other.forwarded_unparsable;
        self.repaired += other.repaired;
        self.nudged += other.nudged;
        self.batches += other.batches;
        self.bytes += other.bytes;
    }

    /// Counter name/value pairs for a log line.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("total", self.total.to_string()),
            ("forwarded", self.forwarded.to_string()),
            ("filtered", self.filtered.to_string()),
            ("dropped", self.dropped().to_string()),
            ("dropped_non_increasing", self.dropped_non_increasing.to_string()),
            ("dropped_unparsable", self.dropped_unparsable.to_string()),
            ("dropped_index_error", self.dropped_index_error.to_string()),
            ("forwarded_unparsable", self.forwarded_unparsable.to_string()),
            ("repaired", self.repaired.to_string()),
            ("nudged", self.nudged.to_string()),
            ("batches", self.batches.to_string()),
            ("bytes", self.bytes.to_string()),
        ]
    }
}
