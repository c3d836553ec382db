//! Calendar-month buckets for weather requests.
//!
//! Dates are grouped by linear month index (relative to 1970-01) so one
//! request per location and month suffices. Each bucket is then classified
//! against today: entirely past, entirely future, or straddling today.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

/// Linear (year, month) index relative to 1970-01 (index 0).
pub fn month_index(date: NaiveDate) -> i64 {
    (i64::from(date.year()) - 1970) * 12 + i64::from(date.month0())
}

/// First and last required day within one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBucket {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

/// One bucket per month touched by `dates`, in calendar order.
pub fn month_buckets(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<MonthBucket> {
    let mut buckets: BTreeMap<i64, MonthBucket> = BTreeMap::new();
    for date in dates {
        buckets
            .entry(month_index(date))
            .and_modify(|b| {
                b.first_day = b.first_day.min(date);
                b.last_day = b.last_day.max(date);
            })
            .or_insert(MonthBucket {
                first_day: date,
                last_day: date,
            });
    }
    buckets.into_values().collect()
}

/// Requests that cover a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketFetch {
    /// Observed weather for `start..=end`.
    Historical { start: NaiveDate, end: NaiveDate },
    /// Forecast of `days` days from today; only `after..=until` is kept.
    Forecast {
        days: u32,
        after: NaiveDate,
        until: NaiveDate,
    },
}

/// Splits a bucket at `today`.
///
/// Today counts as past: its weather is requested from the historical
/// endpoint. Forecast day counts start at today, so `last_day - today + 1`
/// days reach the bucket's last day.
pub fn plan_bucket(bucket: MonthBucket, today: NaiveDate) -> Vec<BucketFetch> {
    let forecast_days = |last: NaiveDate| {
        u32::try_from((last - today).num_days() + 1).unwrap_or(u32::MAX)
    };
    if bucket.last_day <= today {
        vec![BucketFetch::Historical {
            start: bucket.first_day,
            end: bucket.last_day,
        }]
    } else if bucket.first_day > today {
        vec![BucketFetch::Forecast {
            days: forecast_days(bucket.last_day),
            after: bucket.first_day,
            until: bucket.last_day,
        }]
    } else {
        vec![
            BucketFetch::Historical {
                start: bucket.first_day,
                end: today,
            },
            BucketFetch::Forecast {
                days: forecast_days(bucket.last_day),
                after: today.succ_opt().unwrap_or(today),
                until: bucket.last_day,
            },
        ]
    }
}
