//! Bank holidays from feiertage-api.de.
//!
//! `GET {base}?jahr=<year>&nur_land=<state>` answers with an object keyed by
//! holiday name: `{"Neujahrstag": {"datum": "2023-01-01", "hinweis": ""}}`.

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Client;
use serde::Deserialize;
use snafu::ResultExt;

use crate::{
    models::calendar::HolidayEntry,
    providers::{
        ClientBuildSnafu, HolidaySource, ParseSnafu, ProviderError, ProviderInitError,
        http::{decode_json, normalize_base_url, send_for_text},
    },
    utils::dates::parse_provider_date,
};

pub const DEFAULT_BASE_URL: &str = "https://feiertage-api.de/api/";

#[derive(Deserialize, Debug)]
struct FeiertagEntry {
    datum: String,
    #[serde(default)]
    hinweis: String,
}

#[derive(Debug, Clone)]
pub struct FeiertageProvider {
    client: Client,
    base_url: String,
}

impl FeiertageProvider {
    pub fn new(base_url: &str) -> Result<Self, ProviderInitError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder().build().context(ClientBuildSnafu)?;
        Ok(Self { client, base_url })
    }
}

/// Decodes a provider body, keeping the provider's ordering of holidays.
pub fn parse_holiday_body(body: &str, endpoint: &str) -> Result<Vec<HolidayEntry>, ProviderError> {
    let raw: IndexMap<String, FeiertagEntry> = decode_json(body, endpoint)?;
    raw.into_iter()
        .map(|(name, entry)| {
            let date = parse_provider_date(&entry.datum).ok_or_else(|| {
                ParseSnafu {
                    endpoint,
                    message: format!("holiday {name:?} has unreadable date {:?}", entry.datum),
                }
                .build()
            })?;
            Ok(HolidayEntry {
                name,
                date,
                note: entry.hinweis,
            })
        })
        .collect()
}

#[async_trait]
impl HolidaySource for FeiertageProvider {
    async fn bank_holidays(
        &self,
        state: &str,
        year: i32,
    ) -> Result<Vec<HolidayEntry>, ProviderError> {
        let query = [("jahr", year.to_string()), ("nur_land", state.to_string())];
        let request = self.client.get(&self.base_url).query(&query);
        let body = send_for_text(request, &self.base_url).await?;
        parse_holiday_body(&body, &self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn decodes_names_dates_and_notes() {
        let body = r#"{
            "Neujahrstag": {"datum": "2023-01-01", "hinweis": ""},
            "Augsburger Friedensfest": {"datum": "2023-08-08", "hinweis": "Nur im Stadtgebiet Augsburg"}
        }"#;
        let holidays = parse_holiday_body(body, "feiertage").unwrap();
        assert_eq!(holidays.len(), 2);
        assert_eq!(holidays[0].name, "Neujahrstag");
        assert_eq!(holidays[0].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert!(holidays[0].note.is_empty());
        assert!(holidays[1].note.starts_with("Nur"));
    }

    #[test]
    fn missing_note_reads_as_empty() {
        let holidays =
            parse_holiday_body(r#"{"Ostermontag": {"datum": "2023-04-10"}}"#, "f").unwrap();
        assert_eq!(holidays[0].note, "");
    }

    #[test]
    fn error_body_is_a_parse_failure() {
        let err = parse_holiday_body(r#"{"Neujahrstag": "kaputt"}"#, "f").unwrap_err();
        assert!(err.is_retryable());
    }
}
