//! Upload timestamps and report dates.
//!
//! Registries publish upload times either as RFC 3339 strings or as naive
//! `YYYY-MM-DDTHH:MM:SS[.ffffff]` strings. Naive values are read as UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

use crate::error::{TallyError, TallyResult};

/// Point in time a distributable file was published
pub type Timestamp = DateTime<Utc>;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse an upload time as published by the registry
pub fn parse_timestamp(raw: &str) -> TallyResult<Timestamp> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TallyError::InvalidTimestamp {
            value: raw.to_string(),
        })
}

/// Calendar day (UTC) a timestamp falls on
pub fn report_date(timestamp: &Timestamp) -> NaiveDate {
    timestamp.date_naive()
}

/// Format a report day as `M/D/YYYY` without zero padding
pub fn format_report_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}
