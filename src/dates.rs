//! Date detection, parsing and display.
//!
//! Detection (`is_date_like`) is deliberately stricter than parsing
//! (`parse_to_date`): inference must not mistake IDs, quantities or small
//! numbers for dates, while filtering should accept anything that reads as a
//! point in time.

use crate::value::CellValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// 1980-01-01T00:00:00Z in milliseconds.
pub const MIN_TIMESTAMP_MS: f64 = 315_532_800_000.0;
/// 2100-01-01T00:00:00Z in milliseconds.
pub const MAX_TIMESTAMP_MS: f64 = 4_102_444_800_000.0;

/// Calendar shapes a string must have before it is considered a date.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d{4}-\d{2}-\d{2}$",
        r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(:\d{2})?",
        r"^\d{4}/\d{2}/\d{2}$",
        r"^\d{1,2}/\d{1,2}/\d{4}$",
        r"^\d{1,2}-\d{1,2}-\d{4}$",
        r"^\d{1,2}\.\d{1,2}\.\d{4}$",
        r"(?i)^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}$",
        r"(?i)^\d{1,2}\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{4}$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static PURE_INTEGER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^-?\d+$").ok());

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Whether a sampled value counts toward the date classification.
pub fn is_date_like(value: &CellValue) -> bool {
    match value {
        CellValue::Date(_) => true,
        CellValue::Number(ms) => (MIN_TIMESTAMP_MS..=MAX_TIMESTAMP_MS).contains(ms),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || is_pure_integer(trimmed) {
                return false;
            }
            DATE_PATTERNS.iter().any(|p| p.is_match(trimmed)) && parse_date_str(trimmed).is_some()
        }
        _ => false,
    }
}

/// Parse a cell to a point in time for range filtering.
///
/// Zero, `"0"` and empty strings are never dates. Positive numbers are
/// millisecond timestamps.
pub fn parse_to_date(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(ms) if *ms > 0.0 => timestamp_to_date(*ms),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == "0" {
                return None;
            }
            parse_date_str(trimmed)
        }
        _ => None,
    }
}

/// Parse a trimmed string in any of the supported calendar forms.
pub fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Some(stripped) = s.strip_suffix('Z') {
        if let Some(dt) = parse_naive_datetime(stripped) {
            return Some(dt);
        }
    }
    if let Some(dt) = parse_naive_datetime(s) {
        return Some(dt);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn timestamp_to_date(ms: f64) -> Option<NaiveDateTime> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64).map(|dt| dt.naive_utc())
}

fn is_pure_integer(s: &str) -> bool {
    PURE_INTEGER.as_ref().map_or(false, |re| re.is_match(s))
}

/// Short en-US date, e.g. `Jan 5, 2024`.
pub fn format_date(date: NaiveDateTime) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Display text for a cell in a date column.
///
/// Empty markers (`0`, `"0"`, `""`) display as nothing; values that do not
/// parse keep their raw text.
pub fn format_date_value(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Number(n) if *n == 0.0 => String::new(),
        CellValue::Text(s) if s.is_empty() || s == "0" => String::new(),
        other => match parse_to_date(other) {
            Some(date) => format_date(date),
            None => other.to_display_string(),
        },
    }
}

/// Start of the given day.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last millisecond of the given day.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(last)
}
