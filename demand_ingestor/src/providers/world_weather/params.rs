use chrono::NaiveDate;

use crate::models::location::LatLonKey;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query for `past-weather.ashx`: one daily reading (`tp=24`) per day in
/// `start..=end`.
pub fn historical_query(
    location: LatLonKey,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(&'static str, String)> {
    vec![
        ("q", location.to_string()),
        ("date", start.format(DATE_FORMAT).to_string()),
        ("enddate", end.format(DATE_FORMAT).to_string()),
        ("format", "json".to_string()),
        ("tp", "24".to_string()),
    ]
}

/// Query for `weather.ashx`: `days` days from today, no current conditions.
pub fn forecast_query(location: LatLonKey, days: u32) -> Vec<(&'static str, String)> {
    vec![
        ("q", location.to_string()),
        ("num_of_days", days.to_string()),
        ("cc", "no".to_string()),
        ("format", "json".to_string()),
        ("tp", "24".to_string()),
    ]
}
