//! Time zone helpers.
//!
//! Every date in a run is a naive calendar date. The only place a clock is
//! read is "today", which decides whether weather comes from the historical
//! or the forecast endpoint; it is taken in the configured IANA zone so a run
//! shortly after midnight UTC does not see yesterday.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Parse an IANA time zone name (e.g., "Europe/Berlin").
pub fn parse_tz(name: &str) -> anyhow::Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("bad tz: {name}"))
}

/// The calendar date of `instant` in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Today's date in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    local_date(Utc::now(), tz)
}
