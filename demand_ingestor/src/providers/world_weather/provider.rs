use std::num::NonZeroU32;

use async_trait::async_trait;
use chrono::NaiveDate;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::ResultExt;

use crate::{
    models::{location::LatLonKey, weather::WeatherDay},
    providers::{
        ClientBuildSnafu, MissingEnvVarSnafu, ProviderError, ProviderInitError, ValidationSnafu,
        WeatherSource,
        http::{normalize_base_url, send_for_text},
        world_weather::{
            params::{forecast_query, historical_query},
            response::parse_weather_body,
        },
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.worldweatheronline.com/premium/v1";
pub const DEFAULT_REQUESTS_PER_SECOND: NonZeroU32 = nonzero!(5u32);
pub const API_KEY_VAR: &str = "WWO_API_KEY";

pub struct WorldWeatherProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    limiter: DefaultDirectRateLimiter,
}

impl WorldWeatherProvider {
    /// Creates a new weather provider.
    ///
    /// Reads the API key from the `WWO_API_KEY` environment variable.
    pub fn new(base_url: &str, requests_per_second: NonZeroU32) -> Result<Self, ProviderInitError> {
        let api_key =
            SecretString::new(get_env_var(API_KEY_VAR).context(MissingEnvVarSnafu)?.into());
        Self::with_api_key(base_url, api_key, requests_per_second)
    }

    pub fn with_api_key(
        base_url: &str,
        api_key: SecretString,
        requests_per_second: NonZeroU32,
    ) -> Result<Self, ProviderInitError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder().build().context(ClientBuildSnafu)?;
        Ok(Self {
            client,
            base_url,
            api_key,
            limiter: RateLimiter::direct(Quota::per_second(requests_per_second)),
        })
    }

    async fn fetch(
        &self,
        path: &str,
        mut query: Vec<(&'static str, String)>,
    ) -> Result<Vec<WeatherDay>, ProviderError> {
        self.limiter.until_ready().await;

        // The key is attached last so it never appears in the endpoint label.
        let endpoint = format!("{}/{}", self.base_url, path);
        query.push(("key", self.api_key.expose_secret().to_string()));
        let body = send_for_text(self.client.get(&endpoint).query(&query), &endpoint).await?;
        parse_weather_body(&body, &endpoint)
    }
}

#[async_trait]
impl WeatherSource for WorldWeatherProvider {
    async fn historical(
        &self,
        location: LatLonKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeatherDay>, ProviderError> {
        if end < start {
            return ValidationSnafu {
                message: format!("historical range ends before it starts: {start}..{end}"),
            }
            .fail();
        }
        self.fetch("past-weather.ashx", historical_query(location, start, end))
            .await
    }

    async fn forecast(
        &self,
        location: LatLonKey,
        days: u32,
    ) -> Result<Vec<WeatherDay>, ProviderError> {
        if days == 0 {
            return ValidationSnafu {
                message: "forecast needs at least one day",
            }
            .fail();
        }
        self.fetch("weather.ashx", forecast_query(location, days)).await
    }
}
