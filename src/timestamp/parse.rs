//! Field string to [`Instant`] normalization.

use chrono::{FixedOffset, NaiveDateTime, TimeZone};

use super::{Instant, OffsetStyle, TimestampFormat};

/// Length of `YYYY-MM-DD`.
const DATE_LEN: usize = 10;

/// A successfully normalized timestamp field.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTimestamp {
    /// Comparable instant.
    pub instant: Instant,
    /// Original notation, used when the field is rewritten.
    pub format: TimestampFormat,
}

/// Parses a timestamp field.
///
/// Surrounding whitespace is ignored. Returns `None` when the value is
/// not an epoch number or a supported date-time.
pub fn parse_timestamp(raw: &str) -> Option<ParsedTimestamp> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    parse_integer(s)
        .or_else(|| parse_decimal(s))
        .or_else(|| parse_datetime(s))
}

fn parse_integer(s: &str) -> Option<ParsedTimestamp> {
    let seconds: i64 = s.parse().ok()?;
    Some(ParsedTimestamp {
        instant: Instant::from_seconds(seconds as f64)?,
        format: TimestampFormat::Integer,
    })
}

fn parse_decimal(s: &str) -> Option<ParsedTimestamp> {
    let seconds: f64 = s.parse().ok()?;
    let instant = Instant::from_seconds(seconds)?;

    let fraction_digits = match s.find('.') {
        Some(dot) => s[dot + 1..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .count(),
        None => 0,
    };

    Some(ParsedTimestamp {
        instant,
        format: TimestampFormat::Decimal { fraction_digits },
    })
}

fn parse_datetime(s: &str) -> Option<ParsedTimestamp> {
    if !s.is_char_boundary(DATE_LEN) || !s.is_char_boundary(DATE_LEN + 1) {
        return None;
    }

    let date = &s[..DATE_LEN];
    let separator = s[DATE_LEN..].chars().next()?;
    if separator != 'T' && separator != ' ' {
        return None;
    }

    let (time, offset) = split_offset(&s[DATE_LEN + 1..])?;

    let fraction_digits = match time.find('.') {
        Some(dot) => time.len() - dot - 1,
        None => 0,
    };
    let pattern = if fraction_digits > 0 {
        "%Y-%m-%dT%H:%M:%S%.f"
    } else {
        "%Y-%m-%dT%H:%M:%S"
    };
    let naive = NaiveDateTime::parse_from_str(&format!("{}T{}", date, time), pattern).ok()?;

    let zone = FixedOffset::east_opt(offset.seconds_east())?;
    let datetime = zone.from_local_datetime(&naive).single()?;

    let millis = datetime.timestamp() as f64 * 1000.0
        + f64::from(datetime.timestamp_subsec_nanos()) / 1_000_000.0;

    Some(ParsedTimestamp {
        instant: Instant::from_millis(millis)?,
        format: TimestampFormat::DateTime {
            separator,
            fraction_digits,
            offset,
        },
    })
}

/// Splits the time-of-day part from a trailing offset.
///
/// Returns `None` when an offset is present but malformed.
fn split_offset(rest: &str) -> Option<(&str, OffsetStyle)> {
    if let Some(time) = rest.strip_suffix('Z').or_else(|| rest.strip_suffix('z')) {
        return Some((time, OffsetStyle::Zulu));
    }

    let sign_at = match rest.rfind(|c: char| c == '+' || c == '-') {
        Some(i) => i,
        None => return Some((rest, OffsetStyle::Absent)),
    };

    let sign = if rest[sign_at..].starts_with('-') { -1 } else { 1 };
    let tz = &rest[sign_at + 1..];
    if !tz.is_ascii() {
        return None;
    }
    let digits = |part: &str| -> Option<i32> {
        if part.len() == 2 && part.chars().all(|c| c.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };

    let (hours, minutes, style): (i32, i32, fn(i32) -> OffsetStyle) = match tz.len() {
        2 => (digits(tz)?, 0, OffsetStyle::Hours),
        4 => (digits(&tz[..2])?, digits(&tz[2..])?, OffsetStyle::Compact),
        5 if tz.as_bytes()[2] == b':' => (digits(&tz[..2])?, digits(&tz[3..])?, OffsetStyle::Colon),
        _ => return None,
    };

    if hours > 23 || minutes > 59 {
        return None;
    }

    Some((&rest[..sign_at], style(sign * (hours * 3600 + minutes * 60))))
}
