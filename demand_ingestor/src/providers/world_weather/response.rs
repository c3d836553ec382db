//! Response shapes of the weather API and their reduction to [`WeatherDay`].
//!
//! Numbers arrive as strings (`"sunHour": "11.6"`). Only the first hourly
//! block of each day is read; with `tp=24` it is also the only one.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::{
    models::weather::WeatherDay,
    providers::{ParseSnafu, ProviderError, http::decode_json},
};

#[derive(Deserialize, Debug)]
pub struct WwoEnvelope {
    pub data: WwoData,
}

#[derive(Deserialize, Debug)]
pub struct WwoData {
    pub weather: Vec<WwoDay>,
}

#[derive(Deserialize, Debug)]
pub struct WwoDay {
    pub date: NaiveDate,
    #[serde(rename = "sunHour", deserialize_with = "lenient_f64")]
    pub sun_hour: f64,
    pub hourly: Vec<WwoHourly>,
}

#[derive(Deserialize, Debug)]
pub struct WwoHourly {
    #[serde(rename = "weatherCode", deserialize_with = "lenient_f64")]
    pub weather_code: f64,
    #[serde(rename = "FeelsLikeC", deserialize_with = "lenient_f64")]
    pub feels_like_c: f64,
    #[serde(rename = "HeatIndexC", deserialize_with = "lenient_f64")]
    pub heat_index_c: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {s:?}"))),
    }
}

/// Decodes a weather body into one [`WeatherDay`] per reported day.
///
/// An error payload (`{"data": {"error": [...]}}`) has no `weather` list and is
/// reported as a parse failure.
pub fn parse_weather_body(body: &str, endpoint: &str) -> Result<Vec<WeatherDay>, ProviderError> {
    let envelope: WwoEnvelope = decode_json(body, endpoint)?;
    envelope
        .data
        .weather
        .into_iter()
        .map(|day| {
            let Some(first) = day.hourly.first() else {
                return ParseSnafu {
                    endpoint,
                    message: format!("no hourly block for {}", day.date),
                }
                .fail();
            };
            Ok(WeatherDay {
                date: day.date,
                sun_hours: day.sun_hour,
                weather_code: first.weather_code,
                feels_like: first.feels_like_c,
                heat_index: first.heat_index_c,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"data": {"request": [{"type": "LatLon", "query": "Lat 49.79 and Lon 9.93"}],
        "weather": [
            {"date": "2023-06-01", "sunHour": "13.1", "maxtempC": "24",
             "hourly": [{"time": "24", "weatherCode": "113", "FeelsLikeC": "18", "HeatIndexC": "19"},
                        {"time": "48", "weatherCode": "999", "FeelsLikeC": "0", "HeatIndexC": "0"}]},
            {"date": "2023-06-02", "sunHour": 9.5,
             "hourly": [{"time": "24", "weatherCode": "116", "FeelsLikeC": "16", "HeatIndexC": "17"}]}
        ]}}"#;

    #[test]
    fn keeps_first_hourly_reading() {
        let days = parse_weather_body(BODY, "past-weather").unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        assert_eq!(days[0].sun_hours, 13.1);
        assert_eq!(days[0].weather_code, 113.0);
        assert_eq!(days[0].feels_like, 18.0);
        assert_eq!(days[0].heat_index, 19.0);
        assert_eq!(days[1].sun_hours, 9.5);
    }

    #[test]
    fn error_payload_is_a_parse_failure() {
        let body = r#"{"data": {"error": [{"msg": "API key has reached calls per day allowed limit."}]}}"#;
        let err = parse_weather_body(body, "past-weather").unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }));
    }

    #[test]
    fn day_without_hourly_block_is_a_parse_failure() {
        let body = r#"{"data": {"weather": [{"date": "2023-06-01", "sunHour": "1", "hourly": []}]}}"#;
        assert!(parse_weather_body(body, "x").is_err());
    }
}
