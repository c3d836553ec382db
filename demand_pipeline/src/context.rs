use chrono::NaiveDate;

use crate::{calendar::CalendarCache, weather::WeatherCache};

/// State built up during one forecast run and dropped with it.
///
/// The caches are filled before feature assembly starts and only read after
/// that.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Decides between historical and forecast weather.
    pub today: NaiveDate,
    pub calendar: CalendarCache,
    pub weather: WeatherCache,
}

impl RunContext {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            calendar: CalendarCache::default(),
            weather: WeatherCache::default(),
        }
    }
}
