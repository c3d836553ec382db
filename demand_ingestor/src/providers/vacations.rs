//! School vacations from ferien-api.de.
//!
//! `GET {base}/{state}/{year}` answers with a list of ranges whose ends are
//! UTC timestamps such as `2023-02-20T00:00Z`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use snafu::ResultExt;

use crate::{
    models::calendar::VacationRange,
    providers::{
        ClientBuildSnafu, ParseSnafu, ProviderError, ProviderInitError, VacationSource,
        http::{decode_json, normalize_base_url, send_for_text},
    },
    utils::dates::parse_provider_date,
};

pub const DEFAULT_BASE_URL: &str = "https://ferien-api.de/api/v1/holidays";

#[derive(Deserialize, Debug)]
struct FerienEntry {
    start: String,
    end: String,
}

#[derive(Debug, Clone)]
pub struct FerienProvider {
    client: Client,
    base_url: String,
}

impl FerienProvider {
    pub fn new(base_url: &str) -> Result<Self, ProviderInitError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder().build().context(ClientBuildSnafu)?;
        Ok(Self { client, base_url })
    }
}

pub fn parse_vacation_body(
    body: &str,
    endpoint: &str,
) -> Result<Vec<VacationRange>, ProviderError> {
    let raw: Vec<FerienEntry> = decode_json(body, endpoint)?;
    raw.into_iter()
        .map(|entry| {
            let start = parse_provider_date(&entry.start);
            let end = parse_provider_date(&entry.end);
            match (start, end) {
                (Some(start), Some(end)) => Ok(VacationRange { start, end }),
                _ => ParseSnafu {
                    endpoint,
                    message: format!(
                        "unreadable vacation range {:?}..{:?}",
                        entry.start, entry.end
                    ),
                }
                .fail(),
            }
        })
        .collect()
}

#[async_trait]
impl VacationSource for FerienProvider {
    async fn school_vacations(
        &self,
        state: &str,
        year: i32,
    ) -> Result<Vec<VacationRange>, ProviderError> {
        let url = format!("{}/{}/{}", self.base_url, state, year);
        let body = send_for_text(self.client.get(&url), &url).await?;
        parse_vacation_body(&body, &url)
    }
}
