//! Conversions between WARC dates, 14-digit CDX timestamps and ISO-8601.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{Result, WaczError};

const CDX_FORMAT: &str = "%Y%m%d%H%M%S";

/// `2020-10-07T21:22:36Z` (fractions allowed) to `20201007212236`.
pub fn iso_to_timestamp(value: &str) -> Result<String> {
    let parsed = parse_iso(value)?;
    Ok(parsed.format(CDX_FORMAT).to_string())
}

/// `20201007212236` to `2020-10-07T21:22:36Z`.
pub fn timestamp_to_iso(value: &str) -> Result<String> {
    let naive = NaiveDateTime::parse_from_str(value, CDX_FORMAT).map_err(|_| {
        WaczError::InvalidDate {
            value: value.to_string(),
        }
    })?;
    Ok(naive.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Accept either form and return the 14-digit timestamp.
pub fn normalize_timestamp(value: &str) -> Result<String> {
    if value.len() == 14 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(value.to_string())
    } else {
        iso_to_timestamp(value)
    }
}

/// Current time in the manifest's `created` format.
#[must_use]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_iso(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    // WARC/1.0 allows dates without a zone designator or seconds.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed.trim_end_matches('Z'), format) {
            return Ok(naive.and_utc());
        }
    }
    Err(WaczError::InvalidDate {
        value: value.to_string(),
    })
}
