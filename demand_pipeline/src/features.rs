//! Feature names, per-row feature values, and the FeatureAssembler that joins
//! calendar codes, lag columns and weather onto an entity series.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use demand_ingestor::models::{location::Location, weather::WeatherDay};
use thiserror::Error;

use crate::{
    calendar::{CalendarCache, StateCalendar},
    config::FeaturePlan,
    entity::{EntityKey, EntitySeries},
    error::PipelineError,
    lags::LagFrame,
    weather::WeatherCache,
};

/// A model input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Discount,
    /// `wochentag`, Monday = 0.
    Weekday,
    /// `monat`
    Month,
    Datecode,
    /// `lag_<k>`: amount sold k days earlier.
    Lag(u32),
    SunHours,
    WeatherCode,
    FeelsLike,
    HeatIndex,
}

#[derive(Debug, Error)]
#[error("unknown feature name {0:?}")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let feature = match s {
            "discount" => Feature::Discount,
            "wochentag" => Feature::Weekday,
            "monat" => Feature::Month,
            "datecode" => Feature::Datecode,
            "sunhour" => Feature::SunHours,
            "weathercodes" => Feature::WeatherCode,
            "feels_like" => Feature::FeelsLike,
            "heat_index" => Feature::HeatIndex,
            other => {
                let lag = other
                    .strip_prefix("lag_")
                    .and_then(|k| k.parse::<u32>().ok())
                    .filter(|k| *k > 0)
                    .ok_or_else(|| UnknownFeature(other.to_string()))?;
                Feature::Lag(lag)
            }
        };
        Ok(feature)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Discount => f.write_str("discount"),
            Feature::Weekday => f.write_str("wochentag"),
            Feature::Month => f.write_str("monat"),
            Feature::Datecode => f.write_str("datecode"),
            Feature::Lag(k) => write!(f, "lag_{k}"),
            Feature::SunHours => f.write_str("sunhour"),
            Feature::WeatherCode => f.write_str("weathercodes"),
            Feature::FeelsLike => f.write_str("feels_like"),
            Feature::HeatIndex => f.write_str("heat_index"),
        }
    }
}

/// One fully joined row: a sales row that has weather for its date.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub id: i64,
    pub date: NaiveDate,
    pub discount: i64,
    pub weekday: u32,
    pub month: u32,
    pub datecode: u8,
    /// lag offset -> amount
    pub lags: BTreeMap<u32, f64>,
    pub weather: WeatherDay,
}

impl FeatureRow {
    pub fn value(&self, feature: Feature) -> Option<f64> {
        let v = match feature {
            Feature::Discount => self.discount as f64,
            Feature::Weekday => f64::from(self.weekday),
            Feature::Month => f64::from(self.month),
            Feature::Datecode => f64::from(self.datecode),
            Feature::Lag(k) => return self.lags.get(&k).copied(),
            Feature::SunHours => self.weather.sun_hours,
            Feature::WeatherCode => self.weather.weather_code,
            Feature::FeelsLike => self.weather.feels_like,
            Feature::HeatIndex => self.weather.heat_index,
        };
        Some(v)
    }

    /// Values of `features`, in order.
    pub fn vector(&self, features: &[Feature]) -> Result<Vec<f64>, PipelineError> {
        features
            .iter()
            .map(|f| match (f, self.value(*f)) {
                (_, Some(v)) => Ok(v),
                (Feature::Lag(k), None) => Err(PipelineError::UnknownLagColumn(*k)),
                (other, None) => Err(PipelineError::Config(format!("no value for {other}"))),
            })
            .collect()
    }
}

/// The feature matrix of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityFeatures {
    pub key: EntityKey,
    pub rows: Vec<FeatureRow>,
}

/// Joins shared per-run data onto entity series.
///
/// Everything it reads is built before assembly starts and only read here, so
/// entities can be assembled in any order.
pub struct FeatureAssembler<'a> {
    calendar: &'a CalendarCache,
    weather: &'a WeatherCache,
    lag_frame: &'a LagFrame,
    plan: &'a FeaturePlan,
    duration: u32,
}

impl<'a> FeatureAssembler<'a> {
    pub fn new(
        calendar: &'a CalendarCache,
        weather: &'a WeatherCache,
        lag_frame: &'a LagFrame,
        plan: &'a FeaturePlan,
        duration: u32,
    ) -> Self {
        Self {
            calendar,
            weather,
            lag_frame,
            plan,
            duration,
        }
    }

    /// Calendar codes, then lag columns, then an inner join with the weather
    /// of `location`'s rounded coordinates.
    pub fn assemble(
        &self,
        series: &EntitySeries,
        location: &Location,
    ) -> Result<EntityFeatures, PipelineError> {
        let key = series.key();
        let empty = StateCalendar::default();
        let calendar = self.calendar.state(&location.state).unwrap_or(&empty);
        let dates = series.dates();

        let smallest = self.plan.smallest_lag();
        let mut lag_columns = Vec::with_capacity(self.plan.lags.len());
        for &lag in &self.plan.lags {
            let column = self
                .lag_frame
                .lag_column(key, lag, smallest, self.duration, &dates)?;
            lag_columns.push((lag, column));
        }

        let weather = self.weather.series(location.latlon_key());
        let rows = series
            .rows()
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let day = weather?.get(&row.date)?;
                Some(FeatureRow {
                    id: row.id,
                    date: row.date,
                    discount: row.discount,
                    weekday: row.weekday,
                    month: row.month,
                    datecode: calendar.datecode(row.date),
                    lags: lag_columns.iter().map(|(lag, col)| (*lag, col[i])).collect(),
                    weather: day.clone(),
                })
            })
            .collect();

        Ok(EntityFeatures { key, rows })
    }
}
