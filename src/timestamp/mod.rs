//! Timestamp normalization
//!
//! Turns a timestamp field into a comparable [`Instant`] (epoch
//! milliseconds, fractional precision preserved) and remembers how the
//! field was written so a rewritten value can be rendered back in the
//! same convention.
//!
//! Accepted encodings, tried in order:
//! 1. Integer epoch seconds (`1700000000`)
//! 2. Decimal epoch seconds (`1700000000.25`)
//! 3. Date-time: `YYYY-MM-DD` then `T` or a single space, `HH:MM:SS`,
//!    optional fraction, optional offset (`Z`, `+HH`, `+HHMM`, `+HH:MM`).
//!    No offset means UTC.
//!
//! Anything else is unparsable. Parsing never fails with an error.

mod format;
mod parse;

pub use format::format_timestamp;
pub use parse::{parse_timestamp, ParsedTimestamp};

use std::cmp::Ordering;
use std::fmt;

/// Milliseconds per second.
pub const MILLIS_PER_SECOND: f64 = 1000.0;

/// A normalized point in event time, in epoch milliseconds.
///
/// Always finite. Ordering is total over finite values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instant(f64);

impl Instant {
    /// Creates an instant from epoch milliseconds.
    ///
    /// Returns `None` for NaN or infinite input.
    pub fn from_millis(millis: f64) -> Option<Self> {
        if millis.is_finite() {
            Some(Self(millis))
        } else {
            None
        }
    }

    /// Creates an instant from epoch seconds.
    pub fn from_seconds(seconds: f64) -> Option<Self> {
        Self::from_millis(seconds * MILLIS_PER_SECOND)
    }

    /// Epoch milliseconds.
    pub fn millis(&self) -> f64 {
        self.0
    }

    /// Epoch seconds.
    pub fn seconds(&self) -> f64 {
        self.0 / MILLIS_PER_SECOND
    }

    /// Returns this instant moved forward by `seconds`.
    pub fn plus_seconds(&self, seconds: f64) -> Self {
        Self(self.0 + seconds * MILLIS_PER_SECOND)
    }
}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// How a timestamp field was originally written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampFormat {
    /// Whole epoch seconds.
    Integer,
    /// Epoch seconds with a decimal point and `fraction_digits` digits after it.
    Decimal { fraction_digits: usize },
    /// Human-readable date-time.
    DateTime {
        /// `'T'` or `' '`.
        separator: char,
        /// Digits after the seconds dot (0 when absent).
        fraction_digits: usize,
        /// Offset as written.
        offset: OffsetStyle,
    },
}

/// Timezone offset notation of a date-time field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetStyle {
    /// No offset; value is UTC.
    Absent,
    /// `Z`
    Zulu,
    /// `+HH`
    Hours(i32),
    /// `+HHMM`
    Compact(i32),
    /// `+HH:MM`
    Colon(i32),
}

impl OffsetStyle {
    /// Offset east of UTC in seconds.
    pub fn seconds_east(&self) -> i32 {
        match self {
            OffsetStyle::Absent | OffsetStyle::Zulu => 0,
            OffsetStyle::Hours(s) | OffsetStyle::Compact(s) | OffsetStyle::Colon(s) => *s,
        }
    }
}
