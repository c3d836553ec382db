//! Weather per rounded store location.
//!
//! Stores whose coordinates round to the same [`LatLonKey`] share one series,
//! so the provider is queried once per key and month rather than once per
//! store.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use demand_ingestor::{
    models::{location::LatLonKey, weather::WeatherDay},
    providers::WeatherSource,
    requests::retry::RetryPolicy,
};
use tracing::{debug, info};

use crate::{
    bucket::{BucketFetch, month_buckets, plan_bucket},
    error::PipelineError,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WeatherCache {
    series: HashMap<LatLonKey, BTreeMap<NaiveDate, WeatherDay>>,
    /// Dates already requested per key, whether or not the provider had data.
    covered: HashMap<LatLonKey, BTreeSet<NaiveDate>>,
}

impl WeatherCache {
    pub fn series(&self, key: LatLonKey) -> Option<&BTreeMap<NaiveDate, WeatherDay>> {
        self.series.get(&key)
    }

    pub fn locations(&self) -> usize {
        self.series.len()
    }

    /// Dates of `dates` not yet requested for `key`.
    pub fn missing_dates(&self, key: LatLonKey, dates: &[NaiveDate]) -> Vec<NaiveDate> {
        match self.covered.get(&key) {
            Some(covered) => dates.iter().filter(|d| !covered.contains(*d)).copied().collect(),
            None => dates.to_vec(),
        }
    }

    /// Appends the days of `days` that fall in `from..=to` and are not yet
    /// present. Returns how many were added.
    fn append(
        &mut self,
        key: LatLonKey,
        days: Vec<WeatherDay>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> usize {
        let series = self.series.entry(key).or_default();
        let mut added = 0;
        for day in days {
            if day.date < from || day.date > to || series.contains_key(&day.date) {
                continue;
            }
            series.insert(day.date, day);
            added += 1;
        }
        added
    }

    fn mark_covered(&mut self, key: LatLonKey, from: NaiveDate, to: NaiveDate) {
        self.covered
            .entry(key)
            .or_default()
            .extend(from.iter_days().take_while(|d| *d <= to));
    }
}

/// Seeds a cache from known readings. The first reading of a date wins.
impl FromIterator<(LatLonKey, WeatherDay)> for WeatherCache {
    fn from_iter<I: IntoIterator<Item = (LatLonKey, WeatherDay)>>(iter: I) -> Self {
        let mut cache = Self::default();
        for (key, day) in iter {
            cache.covered.entry(key).or_default().insert(day.date);
            cache.series.entry(key).or_default().entry(day.date).or_insert(day);
        }
        cache
    }
}

pub struct WeatherService<'a> {
    source: &'a dyn WeatherSource,
    retry: RetryPolicy,
}

impl<'a> WeatherService<'a> {
    pub fn new(source: &'a dyn WeatherSource) -> Self {
        Self {
            source,
            retry: RetryPolicy::ONCE,
        }
    }

    /// Fetches weather covering `dates` for every key in `locations`.
    ///
    /// Requests go out one at a time, one or two per (location, month), and
    /// only for dates the cache has not requested before. A location's
    /// readings are stored once all of its requests succeeded, so a failure
    /// leaves the cache as it was for that location.
    pub async fn fill(
        &self,
        cache: &mut WeatherCache,
        locations: &BTreeSet<LatLonKey>,
        dates: &[NaiveDate],
        today: NaiveDate,
    ) -> Result<(), PipelineError> {
        for &key in locations {
            let missing = cache.missing_dates(key, dates);
            if missing.is_empty() {
                continue;
            }
            let buckets = month_buckets(missing);
            let mut fetched = Vec::new();
            for bucket in &buckets {
                for fetch in plan_bucket(*bucket, today) {
                    match fetch {
                        BucketFetch::Historical { start, end } => {
                            let days = self
                                .retry
                                .run("historical weather", move || {
                                    self.source.historical(key, start, end)
                                })
                                .await?;
                            fetched.push((days, start, end));
                        }
                        BucketFetch::Forecast { days, after, until } => {
                            let forecast = self
                                .retry
                                .run("weather forecast", move || self.source.forecast(key, days))
                                .await?;
                            fetched.push((forecast, after, until));
                        }
                    }
                }
            }

            let mut added = 0;
            for (days, from, to) in fetched {
                added += cache.append(key, days, from, to);
            }
            for bucket in &buckets {
                cache.mark_covered(key, bucket.first_day, bucket.last_day);
            }
            debug!(%key, buckets = buckets.len(), added, "weather fetched");
        }
        info!(
            locations = cache.locations(),
            "weather data retrieved from distinct locations"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Datelike;
    use demand_ingestor::providers::{ApiSnafu, ProviderError};

    use super::*;

    fn day(date: NaiveDate, sun: f64) -> WeatherDay {
        WeatherDay {
            date,
            sun_hours: sun,
            weather_code: 113.0,
            feels_like: 20.0,
            heat_index: 21.0,
        }
    }

    #[test]
    fn append_keeps_first_reading_and_range() {
        let d = |n| NaiveDate::from_ymd_opt(2024, 6, n).unwrap();
        let key = LatLonKey::new(48.14, 11.58);
        let mut cache = WeatherCache::default();
        assert_eq!(cache.append(key, vec![day(d(1), 1.0), day(d(2), 2.0)], d(1), d(30)), 2);
        assert_eq!(
            cache.append(key, vec![day(d(2), 9.0), day(d(3), 3.0), day(d(20), 5.0)], d(3), d(10)),
            1
        );
        let series = cache.series(key).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[&d(2)].sun_hours, 2.0);
    }

    /// Serves June 2024 and answers anything later with a server error.
    #[derive(Default)]
    struct JuneOnly {
        calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
    }

    #[async_trait]
    impl WeatherSource for JuneOnly {
        async fn historical(
            &self,
            _location: LatLonKey,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<WeatherDay>, ProviderError> {
            self.calls.lock().unwrap().push((start, end));
            if start.month() != 6 {
                return ApiSnafu {
                    endpoint: "past-weather",
                    status: 500u16,
                    message: "down",
                }
                .fail();
            }
            Ok(start
                .iter_days()
                .take_while(|d| *d <= end)
                .map(|d| day(d, 7.0))
                .collect())
        }

        async fn forecast(
            &self,
            _location: LatLonKey,
            _days: u32,
        ) -> Result<Vec<WeatherDay>, ProviderError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn only_unrequested_dates_are_fetched_again() {
        let d = |n| NaiveDate::from_ymd_opt(2024, 6, n).unwrap();
        let key = LatLonKey::new(48.14, 11.58);
        let source = JuneOnly::default();
        let service = WeatherService::new(&source);
        let mut cache = WeatherCache::default();
        let today = d(30);

        service
            .fill(&mut cache, &BTreeSet::from([key]), &[d(1), d(2), d(3)], today)
            .await
            .unwrap();
        service
            .fill(&mut cache, &BTreeSet::from([key]), &[d(2), d(4), d(5)], today)
            .await
            .unwrap();
        service
            .fill(&mut cache, &BTreeSet::from([key]), &[d(1), d(5)], today)
            .await
            .unwrap();

        assert_eq!(*source.calls.lock().unwrap(), vec![(d(1), d(3)), (d(4), d(5))]);
        assert_eq!(cache.series(key).unwrap().len(), 5);
    }

    #[tokio::test]
    async fn failed_location_leaves_no_trace() {
        let june = NaiveDate::from_ymd_opt(2024, 6, 29).unwrap();
        let july = NaiveDate::from_ymd_opt(2024, 7, 2).unwrap();
        let key = LatLonKey::new(48.14, 11.58);
        let source = JuneOnly::default();
        let mut cache = WeatherCache::default();

        let err = WeatherService::new(&source)
            .fill(&mut cache, &BTreeSet::from([key]), &[june, july], july)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Provider(_)));
        assert!(cache.series(key).is_none());
        assert_eq!(cache.missing_dates(key, &[june, july]), vec![june, july]);
    }
}
