//! Inclusion filter
//!
//! Allow-list over one column. Applied before ordering so that filtered
//! records never influence ordering state.

use std::collections::HashSet;

use crate::source::Record;

/// Passes a record iff its column is in range and the trimmed value is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionFilter {
    column: usize,
    allowed: HashSet<String>,
}

impl InclusionFilter {
    /// Allowed values are trimmed on construction.
    pub fn new<I, S>(column: usize, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            column,
            allowed: allowed
                .into_iter()
                .map(|v| v.as_ref().trim().to_string())
                .collect(),
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn matches(&self, record: &Record) -> bool {
        record
            .field(self.column)
            .map(|value| self.allowed.contains(value.trim()))
            .unwrap_or(false)
    }
}

/// Applies an optional filter; no filter passes everything.
pub fn passes(filter: Option<&InclusionFilter>, record: &Record) -> bool {
    filter.map_or(true, |f| f.matches(record))
}
