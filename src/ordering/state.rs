//! Per-pass ordering state

use std::collections::HashMap;

use crate::source::Record;
use crate::timestamp::Instant;

/// Partition key: the selected fields of a record, whitespace-trimmed.
///
/// A key column beyond the record's field count contributes an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(Vec<String>);

impl Key {
    /// Extracts the key of `record` over `cols`.
    pub fn extract(record: &Record, cols: &[usize]) -> Self {
        Self(
            cols.iter()
                .map(|&col| {
                    record
                        .field(col)
                        .map(|value| value.trim().to_string())
                        .unwrap_or_default()
                })
                .collect(),
        )
    }

    /// Key values in column order.
    pub fn values(&self) -> &[String] {
        &self.0
    }
}

/// Last accepted instants, globally and per key.
///
/// Owned by one session's engine and reset at the start of every pass.
/// Absent entries behave as negative infinity.
#[derive(Debug, Default)]
pub struct OrderingState {
    global: Option<Instant>,
    per_key: HashMap<Key, Instant>,
}

impl OrderingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything, as if no record had been accepted.
    pub fn reset(&mut self) {
        self.global = None;
        self.per_key.clear();
    }

    /// Last accepted instant over the whole stream.
    pub fn last_global(&self) -> Option<Instant> {
        self.global
    }

    /// Last accepted instant for `key`.
    pub fn last_for(&self, key: &Key) -> Option<Instant> {
        self.per_key.get(key).copied()
    }

    /// Number of keys seen this pass.
    pub fn key_count(&self) -> usize {
        self.per_key.len()
    }

    pub(crate) fn accept_global(&mut self, instant: Instant) {
        self.global = Some(instant);
    }

    pub(crate) fn accept_key(&mut self, key: Key, instant: Instant) {
        self.per_key.insert(key, instant);
    }
}
