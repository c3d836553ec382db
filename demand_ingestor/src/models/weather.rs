use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of weather at one location, reduced to the first hourly reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    pub date: NaiveDate,
    pub sun_hours: f64,
    pub weather_code: f64,
    /// Felt temperature in °C.
    pub feels_like: f64,
    /// Heat index in °C.
    pub heat_index: f64,
}
