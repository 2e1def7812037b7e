//! Timestamp normalization from heterogeneous cell representations.
//!
//! Two representations are understood:
//! - **epoch seconds**: numeric (or numeric-looking text) seconds since the
//!   Unix epoch, fractional seconds allowed
//! - **calendar strings**: a permissive, locale-agnostic date grammar covering
//!   ISO-8601 / RFC 3339, RFC 2822, slash and dot separated dates and
//!   month-name forms such as `Mar 5, 2023`
//!
//! Normalization never panics and never aborts a column: every cell yields
//! either an [`Instant`] or a tagged [`NormalizeError`] that the caller can log,
//! count, or ignore.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::{Cell, ColumnView};

/// How a date column encodes its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// Seconds since 1970-01-01T00:00:00Z
    EpochSeconds,
    /// Calendar text such as `2023-04-01` or `04/01/2023 10:00`
    CalendarString,
    /// No temporal interpretation
    None,
}

impl Representation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::EpochSeconds => "epoch_seconds",
            Representation::CalendarString => "calendar_string",
            Representation::None => "none",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized point in time (UTC).
///
/// Only ever produced from a non-null, successfully parsed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instant(DateTime<Utc>);

impl Instant {
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Midnight UTC of `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(Utc.from_utc_datetime(&date.and_time(NaiveTime::default())))
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Calendar date of the instant in UTC.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// ISO-8601 rendering without offset, e.g. `2023-01-05T10:00:00`.
    pub fn to_iso(&self) -> String {
        self.0.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// Why a cell did not produce an [`Instant`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// The cell was null or blank.
    #[error("cell is null")]
    Null,

    /// The cell's content does not match the representation.
    #[error("cannot parse '{value}' as {representation}")]
    Unparsable {
        value: String,
        representation: Representation,
    },

    /// A numeric value lies outside the representable calendar.
    #[error("epoch value {value} is out of range")]
    OutOfRange { value: f64 },
}

/// Converts one cell into an instant.
pub fn normalize(cell: Cell<'_>, representation: Representation) -> Result<Instant, NormalizeError> {
    match (cell, representation) {
        (Cell::Null, _) => Err(NormalizeError::Null),
        (Cell::Number(value), Representation::EpochSeconds) => from_epoch_seconds(value),
        (Cell::Text(text), Representation::EpochSeconds) => match text.parse::<f64>() {
            Ok(value) => from_epoch_seconds(value),
            Err(_) => Err(unparsable(text, representation)),
        },
        (Cell::Text(text), Representation::CalendarString) => {
            parse_calendar(text).ok_or_else(|| unparsable(text, representation))
        }
        (Cell::Number(value), _) => Err(unparsable(&value.to_string(), representation)),
        (Cell::Text(text), Representation::None) => Err(unparsable(text, representation)),
    }
}

fn unparsable(value: &str, representation: Representation) -> NormalizeError {
    NormalizeError::Unparsable {
        value: value.to_string(),
        representation,
    }
}

/// Interprets `value` as seconds since the Unix epoch.
pub fn from_epoch_seconds(value: f64) -> Result<Instant, NormalizeError> {
    if !value.is_finite() {
        return Err(NormalizeError::OutOfRange { value });
    }
    let secs = value.floor();
    if secs.abs() > i64::MAX as f64 / 2.0 {
        return Err(NormalizeError::OutOfRange { value });
    }
    let nanos = (((value - secs) * 1e9).round() as u32).min(999_999_999);
    DateTime::<Utc>::from_timestamp(secs as i64, nanos)
        .map(Instant)
        .ok_or(NormalizeError::OutOfRange { value })
}

/// Shape families the calendar grammar distinguishes before trying formats.
struct CalendarPatterns {
    numeric: Regex,
    iso: Regex,
    iso_year_month: Regex,
    slash: Regex,
    dotted: Regex,
    month_name: Regex,
}

static PATTERNS: Lazy<CalendarPatterns> = Lazy::new(|| CalendarPatterns {
    numeric: Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid regex"),
    iso: Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}").expect("valid regex"),
    iso_year_month: Regex::new(r"^\d{4}-\d{1,2}$").expect("valid regex"),
    slash: Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}").expect("valid regex"),
    dotted: Regex::new(r"^\d{1,2}\.\d{1,2}\.\d{4}").expect("valid regex"),
    month_name: Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\b",
    )
    .expect("valid regex"),
});

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];
const ISO_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];
const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const SLASH_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
];
const SLASH_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%d/%m/%Y"];
const DOTTED_FORMATS: &[&str] = &["%d.%m.%Y %H:%M:%S", "%d.%m.%Y %H:%M"];
const DOTTED_DATE_FORMATS: &[&str] = &["%d.%m.%Y"];
const NAMED_DATETIME_FORMATS: &[&str] = &[
    "%b %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
];
const NAMED_DATE_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%a, %d %b %Y",
];

/// Parses calendar text with the permissive grammar.
///
/// Values without an offset are taken as UTC. Pure numbers are rejected so a
/// column of numeric text never passes as calendar strings.
pub fn parse_calendar(text: &str) -> Option<Instant> {
    let text = text.trim();
    if text.is_empty() || PATTERNS.numeric.is_match(text) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Instant::from_datetime(dt.with_timezone(&Utc)));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(Instant::from_datetime(dt.with_timezone(&Utc)));
    }

    let text = strip_utc_suffix(text);

    if PATTERNS.iso.is_match(text) {
        return parse_with_offset(text, ISO_OFFSET_FORMATS)
            .or_else(|| parse_naive(text, ISO_DATETIME_FORMATS, ISO_DATE_FORMATS));
    }
    if PATTERNS.iso_year_month.is_match(text) {
        return NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d")
            .ok()
            .map(Instant::from_date);
    }
    if PATTERNS.slash.is_match(text) {
        return parse_naive(text, SLASH_DATETIME_FORMATS, SLASH_DATE_FORMATS);
    }
    if PATTERNS.dotted.is_match(text) {
        return parse_naive(text, DOTTED_FORMATS, DOTTED_DATE_FORMATS);
    }
    if PATTERNS.month_name.is_match(text) {
        return parse_naive(text, NAMED_DATETIME_FORMATS, NAMED_DATE_FORMATS);
    }
    None
}

fn strip_utc_suffix(text: &str) -> &str {
    for suffix in [" UTC", " GMT", "Z"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            return stripped.trim_end();
        }
    }
    text
}

fn parse_with_offset(text: &str, formats: &[&str]) -> Option<Instant> {
    formats
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
        .map(|dt| Instant::from_datetime(dt.with_timezone(&Utc)))
}

fn parse_naive(text: &str, datetime_formats: &[&str], date_formats: &[&str]) -> Option<Instant> {
    datetime_formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| Instant::from_datetime(Utc.from_utc_datetime(&naive)))
        .or_else(|| {
            date_formats
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .map(Instant::from_date)
        })
}

/// A cell that could not be normalized, with its row position.
#[derive(Debug, Clone, PartialEq)]
pub struct CellFailure {
    pub row: usize,
    pub error: NormalizeError,
}

/// Outcome of normalizing a whole column.
#[derive(Debug, Clone, Default)]
pub struct NormalizedColumn {
    /// Instants in row order, nulls and failures removed.
    pub instants: Vec<Instant>,
    /// Non-null cells that failed to parse.
    pub failures: Vec<CellFailure>,
    /// Number of null cells skipped.
    pub null_count: usize,
}

impl NormalizedColumn {
    pub fn earliest(&self) -> Option<Instant> {
        self.instants.iter().min().copied()
    }

    pub fn latest(&self) -> Option<Instant> {
        self.instants.iter().max().copied()
    }
}

/// Normalizes every cell of `column`; bad cells are collected, not raised.
pub fn normalize_column(column: &ColumnView, representation: Representation) -> NormalizedColumn {
    let mut result = NormalizedColumn::default();
    for (row, cell) in column.cells().enumerate() {
        match normalize(cell, representation) {
            Ok(instant) => result.instants.push(instant),
            Err(NormalizeError::Null) => result.null_count += 1,
            Err(error) => result.failures.push(CellFailure { row, error }),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_epoch_seconds() {
        let instant = normalize(Cell::Number(1_672_531_200.0), Representation::EpochSeconds).unwrap();
        assert_eq!(instant.date(), ymd(2023, 1, 1));

        let fractional = normalize(Cell::Number(1_672_531_200.5), Representation::EpochSeconds).unwrap();
        assert_eq!(fractional.datetime().timestamp_subsec_millis(), 500);

        let from_text = normalize(Cell::Text("1672531200"), Representation::EpochSeconds).unwrap();
        assert_eq!(from_text, instant);
    }

    #[test]
    fn test_epoch_out_of_range() {
        assert!(matches!(
            from_epoch_seconds(f64::INFINITY),
            Err(NormalizeError::OutOfRange { .. })
        ));
        assert!(matches!(
            from_epoch_seconds(1e300),
            Err(NormalizeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_null_is_never_an_instant() {
        assert_eq!(
            normalize(Cell::Null, Representation::EpochSeconds),
            Err(NormalizeError::Null)
        );
        assert_eq!(
            normalize(Cell::Null, Representation::CalendarString),
            Err(NormalizeError::Null)
        );
    }

    #[test]
    fn test_calendar_grammar() {
        let cases = [
            ("2023-03-05", ymd(2023, 3, 5)),
            ("2023/03/05", ymd(2023, 3, 5)),
            ("2023-03-05T10:20:30", ymd(2023, 3, 5)),
            ("2023-03-05 10:20:30.123", ymd(2023, 3, 5)),
            ("2023-03-05T23:30:00-05:00", ymd(2023, 3, 6)),
            ("2023-03-05T10:20:30Z", ymd(2023, 3, 5)),
            ("2023-03-05 10:20:30 UTC", ymd(2023, 3, 5)),
            ("2023-03", ymd(2023, 3, 1)),
            ("03/05/2023", ymd(2023, 3, 5)),
            ("25/12/2023", ymd(2023, 12, 25)),
            ("05.03.2023", ymd(2023, 3, 5)),
            ("Mar 5, 2023", ymd(2023, 3, 5)),
            ("March 5, 2023", ymd(2023, 3, 5)),
            ("5 March 2023", ymd(2023, 3, 5)),
            ("Sun, 05 Mar 2023 10:00:00 +0000", ymd(2023, 3, 5)),
        ];
        for (text, expected) in cases {
            let instant = parse_calendar(text).unwrap_or_else(|| panic!("failed to parse {text}"));
            assert_eq!(instant.date(), expected, "wrong date for {text}");
        }
    }

    #[test]
    fn test_calendar_rejects_non_dates() {
        for text in ["alice", "42", "1672531200", "0x5f3a", "2023-13-45", "", "mainnet"] {
            assert!(parse_calendar(text).is_none(), "unexpectedly parsed {text}");
        }
    }

    #[test]
    fn test_unparsable_is_tagged() {
        let err = normalize(Cell::Text("yesterday"), Representation::CalendarString).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::Unparsable {
                value: "yesterday".to_string(),
                representation: Representation::CalendarString,
            }
        );
        assert_eq!(err.to_string(), "cannot parse 'yesterday' as calendar_string");
    }

    #[test]
    fn test_normalize_column_collects_failures() {
        let table = Table::builder()
            .text(
                "createdAt",
                [Some("2023-01-01"), None, Some("garbage"), Some("2023-02-01")],
            )
            .build()
            .unwrap();
        let column = table.column(0).unwrap();

        let normalized = normalize_column(&column, Representation::CalendarString);
        assert_eq!(normalized.instants.len(), 2);
        assert_eq!(normalized.null_count, 1);
        assert_eq!(normalized.failures.len(), 1);
        assert_eq!(normalized.failures[0].row, 2);
        assert_eq!(normalized.earliest().unwrap().date(), ymd(2023, 1, 1));
        assert_eq!(normalized.latest().unwrap().date(), ymd(2023, 2, 1));
    }

    #[test]
    fn test_instant_iso() {
        let instant = Instant::from_date(ymd(2022, 7, 9));
        assert_eq!(instant.to_iso(), "2022-07-09T00:00:00");
    }
}
