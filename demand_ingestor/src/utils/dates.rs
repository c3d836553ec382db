//! Date parsing for the assorted formats the upstream services emit.
//!
//! - Ledger: `2023-06-30`, occasionally with a midnight time part.
//! - Vacation provider: `2023-02-20T00:00Z`, or RFC 3339 with an offset.
//!
//! Timestamps with an offset are converted to UTC before the time zone is
//! dropped, so `2023-02-20T00:30+01:00` lands on 2023-02-19.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, de};

const NAIVE_DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses a calendar date out of a provider timestamp. Returns `None` when
/// nothing date-like can be recovered.
pub fn parse_provider_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    // RFC 3339 minus the seconds, e.g. `2023-02-20T00:00+01:00`
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    // A trailing `Z` is UTC already; parse the rest as naive.
    let naive = s.strip_suffix('Z').unwrap_or(s);
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|dt| dt.date())
}

/// Serde adapter for [`parse_provider_date`].
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_provider_date(&raw)
        .ok_or_else(|| de::Error::custom(format!("unrecognised date: {raw}")))
}
