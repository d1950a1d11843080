//! Rendering a rewritten [`Instant`] in the field's original notation.

use chrono::{DateTime, FixedOffset};

use super::{Instant, OffsetStyle, TimestampFormat};

/// Fractional digits used for decimal seconds beyond the original width.
const DECIMAL_PRECISION: usize = 6;

/// Renders `instant` following `format`.
///
/// Whole-second values keep whole-second notation. Fractions are only
/// written when the original had one or the value needs it.
pub fn format_timestamp(instant: Instant, format: &TimestampFormat) -> String {
    match format {
        TimestampFormat::Integer => render_seconds(instant.seconds(), 0),
        TimestampFormat::Decimal { fraction_digits } => {
            render_seconds(instant.seconds(), *fraction_digits)
        }
        TimestampFormat::DateTime {
            separator,
            fraction_digits,
            offset,
        } => render_datetime(instant, *separator, *fraction_digits, *offset)
            .unwrap_or_else(|| render_seconds(instant.seconds(), 0)),
    }
}

fn render_seconds(seconds: f64, min_digits: usize) -> String {
    let precision = DECIMAL_PRECISION.max(min_digits);
    let mut out = format!("{:.*}", precision, seconds);

    if let Some(dot) = out.find('.') {
        let keep = dot + 1 + min_digits;
        while out.len() > keep && out.ends_with('0') {
            out.pop();
        }
        if out.ends_with('.') {
            out.pop();
        }
    }

    if out == "-0" {
        out = "0".to_string();
    }
    out
}

fn render_datetime(
    instant: Instant,
    separator: char,
    min_digits: usize,
    offset: OffsetStyle,
) -> Option<String> {
    let millis = instant.millis();
    let secs = (millis / 1000.0).floor();
    let nanos = (((millis - secs * 1000.0) * 1_000_000.0).round() as u32).min(999_999_999);

    let zone = FixedOffset::east_opt(offset.seconds_east())?;
    let datetime = DateTime::from_timestamp(secs as i64, nanos)?.with_timezone(&zone);

    let mut out = datetime
        .format(&format!("%Y-%m-%d{}%H:%M:%S", separator))
        .to_string();

    let nano_digits = format!("{:09}", nanos);
    let needed = nano_digits.trim_end_matches('0').len();
    let digits = min_digits.max(needed).min(9);
    if digits > 0 {
        out.push('.');
        out.push_str(&nano_digits[..digits]);
    }

    out.push_str(&render_offset(offset));
    Some(out)
}

fn render_offset(offset: OffsetStyle) -> String {
    let total = offset.seconds_east();
    let sign = if total < 0 { '-' } else { '+' };
    let hours = total.abs() / 3600;
    let minutes = (total.abs() % 3600) / 60;

    match offset {
        OffsetStyle::Absent => String::new(),
        OffsetStyle::Zulu => "Z".to_string(),
        OffsetStyle::Hours(_) => format!("{}{:02}", sign, hours),
        OffsetStyle::Compact(_) => format!("{}{:02}{:02}", sign, hours, minutes),
        OffsetStyle::Colon(_) => format!("{}{:02}:{:02}", sign, hours, minutes),
    }
}
