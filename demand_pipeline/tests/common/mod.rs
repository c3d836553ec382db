#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use demand_ingestor::{
    models::{
        calendar::{HolidayEntry, VacationRange},
        location::{LatLonKey, Location},
        sales::{SalesAmount, SalesField, SalesRecord},
        weather::WeatherDay,
    },
    providers::{
        HolidaySource, LocationSource, ProviderError, SalesLedger, VacationSource, WeatherSource,
    },
};
use demand_pipeline::{
    config::{FeaturePlan, MissingModelPolicy},
    entity::EntityKey,
    features::Feature,
    pipeline::{RunSettings, Sources},
    regressor::{LinearModel, ModelRegistry},
    safety::SafetyFactors,
};
use indexmap::IndexMap;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub const STORES: [u32; 4] = [1, 2, 3, 10];
pub const ARTICLES: [u32; 3] = [100, 200, 300];

/// Known amount of every (date, store, article) in the fake ledger.
pub fn amount(date: NaiveDate, store: u32, article: u32) -> f64 {
    f64::from(date.day() + store * 3 + article / 100)
}

/// Ledger holding every store × article for each day of Nov and Dec 2023,
/// ordered by date, store, article.
pub struct FakeLedger {
    rows: Vec<SalesRecord>,
}

impl FakeLedger {
    pub fn new() -> Self {
        let mut rows = Vec::new();
        let mut id = 0;
        for date in day(2023, 11, 1).iter_days().take_while(|d| *d <= day(2023, 12, 31)) {
            for store in STORES {
                for article in ARTICLES {
                    id += 1;
                    rows.push(SalesRecord {
                        id,
                        store,
                        article,
                        discount: Some(0),
                        date,
                        amount: Some(amount(date, store, article)),
                    });
                }
            }
        }
        Self { rows }
    }
}

#[async_trait]
impl SalesLedger for FakeLedger {
    async fn distinct_count(&self, field: SalesField) -> Result<usize, ProviderError> {
        Ok(match field {
            SalesField::Store => STORES.len(),
            SalesField::Article => ARTICLES.len(),
            SalesField::Date => 61,
        })
    }

    async fn sales_dates(&self) -> Result<Vec<NaiveDate>, ProviderError> {
        let mut dates: Vec<_> = self.rows.iter().map(|r| r.date).collect();
        dates.dedup();
        Ok(dates)
    }

    async fn sales_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> Result<Vec<SalesRecord>, ProviderError> {
        let skip = (page as usize - 1) * page_size;
        Ok(self.rows.iter().skip(skip).take(page_size).cloned().collect())
    }

    async fn sales_amounts(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        page_size: usize,
    ) -> Result<Vec<SalesAmount>, ProviderError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.date >= from && r.date <= to)
            .take(page_size)
            .map(|r| SalesAmount {
                id: r.id,
                store: r.store,
                article: r.article,
                date: r.date,
                amount: r.amount,
            })
            .collect())
    }
}

pub struct FakeLocations;

pub fn location(store: u32, state: &str, lat: f64, lon: f64) -> Location {
    Location {
        id: Some(i64::from(store)),
        store,
        street: None,
        zipcode: None,
        city: None,
        state: state.to_string(),
        lat,
        lon,
    }
}

#[async_trait]
impl LocationSource for FakeLocations {
    async fn locations(&self) -> Result<Vec<Location>, ProviderError> {
        // Stores 1 and 2 round to the same key; store 10 has no record.
        Ok(vec![
            location(1, "BY", 48.137, 11.576),
            location(2, "BY", 48.139, 11.578),
            location(3, "BW", 48.775, 9.182),
        ])
    }
}

#[derive(Default)]
pub struct FakeCalendar {
    pub holiday_calls: Mutex<Vec<(String, i32)>>,
    pub vacation_calls: Mutex<Vec<(String, i32)>>,
}

#[async_trait]
impl HolidaySource for FakeCalendar {
    async fn bank_holidays(
        &self,
        state: &str,
        year: i32,
    ) -> Result<Vec<HolidayEntry>, ProviderError> {
        self.holiday_calls.lock().unwrap().push((state.to_string(), year));
        let entry = |name: &str, m, d, note: &str| HolidayEntry {
            name: name.to_string(),
            date: day(year, m, d),
            note: note.to_string(),
        };
        let mut holidays = vec![
            entry("1. Weihnachtstag", 12, 25, ""),
            entry("2. Weihnachtstag", 12, 26, ""),
        ];
        if state == "BY" {
            holidays.push(entry("Buß und Bettag", 11, 22, "Nur schulfrei"));
        }
        Ok(holidays)
    }
}

#[async_trait]
impl VacationSource for FakeCalendar {
    async fn school_vacations(
        &self,
        state: &str,
        year: i32,
    ) -> Result<Vec<VacationRange>, ProviderError> {
        self.vacation_calls.lock().unwrap().push((state.to_string(), year));
        Ok(vec![VacationRange {
            start: day(year, 12, 27),
            end: day(year + 1, 1, 5),
        }])
    }
}

/// Sun hours are `day of month + rounded longitude`, so stores with distinct
/// keys see distinct weather.
#[derive(Default)]
pub struct FakeWeather {
    pub historical_calls: Mutex<Vec<(LatLonKey, NaiveDate, NaiveDate)>>,
    pub forecast_calls: Mutex<Vec<(LatLonKey, u32)>>,
    pub today: Option<NaiveDate>,
}

pub fn weather_day(key: LatLonKey, date: NaiveDate) -> WeatherDay {
    WeatherDay {
        date,
        sun_hours: f64::from(date.day()) + key.lon().round(),
        weather_code: 113.0,
        feels_like: 5.0,
        heat_index: 6.0,
    }
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn historical(
        &self,
        location: LatLonKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeatherDay>, ProviderError> {
        self.historical_calls.lock().unwrap().push((location, start, end));
        Ok(start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| weather_day(location, d))
            .collect())
    }

    async fn forecast(
        &self,
        location: LatLonKey,
        days: u32,
    ) -> Result<Vec<WeatherDay>, ProviderError> {
        self.forecast_calls.lock().unwrap().push((location, days));
        let today = self.today.unwrap_or(day(2024, 1, 1));
        Ok(today
            .iter_days()
            .take(days as usize)
            .map(|d| weather_day(location, d))
            .collect())
    }
}

pub struct World {
    pub ledger: Arc<FakeLedger>,
    pub calendar: Arc<FakeCalendar>,
    pub weather: Arc<FakeWeather>,
}

impl World {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(FakeLedger::new()),
            calendar: Arc::new(FakeCalendar::default()),
            weather: Arc::new(FakeWeather::default()),
        }
    }

    pub fn sources(&self) -> Sources {
        Sources {
            ledger: self.ledger.clone(),
            locations: Arc::new(FakeLocations),
            holidays: self.calendar.clone(),
            vacations: self.calendar.clone(),
            weather: self.weather.clone(),
        }
    }
}

/// Features `datecode, lag_7, sunhour`; lags 7 and 14; categories split
/// calendar from history from weather.
pub fn settings(start_date: NaiveDate, duration: u32) -> RunSettings {
    RunSettings {
        start_date,
        duration,
        excluded_stores: vec![10],
        missing_model: MissingModelPolicy::Skip,
        max_concurrent_pages: 4,
        weather_includes_lag_window: true,
        plan: FeaturePlan {
            lags: vec![7, 14],
            features: vec![Feature::Datecode, Feature::Lag(7), Feature::SunHours],
            categories: IndexMap::from([
                ("dayspecific".to_string(), vec![0]),
                ("lastmonth".to_string(), vec![1]),
                ("weather".to_string(), vec![2]),
            ]),
        },
    }
}

/// Article 100 predicts its datecode, 200 its lag_7, 300 its sun hours.
pub fn registry() -> ModelRegistry {
    let mut registry = ModelRegistry::default();
    for store in [1, 2, 3] {
        for (article, coefficients) in [
            (100, vec![1.0, 0.0, 0.0]),
            (200, vec![0.0, 1.0, 0.0]),
            (300, vec![0.0, 0.0, 1.0]),
        ] {
            registry.insert(
                EntityKey::new(store, article),
                Arc::new(LinearModel {
                    intercept: 0.0,
                    coefficients,
                    means: vec![0.0, 0.0, 0.0],
                }),
            );
        }
    }
    registry
}

pub fn safety() -> SafetyFactors {
    [1, 2, 3]
        .into_iter()
        .flat_map(|store| ARTICLES.map(|article| (EntityKey::new(store, article), 0.25)))
        .collect()
}
