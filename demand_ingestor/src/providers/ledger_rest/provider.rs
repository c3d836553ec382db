use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use snafu::ResultExt;

use crate::{
    models::{
        location::Location,
        sales::{SalesAmount, SalesField, SalesRecord},
    },
    providers::{
        ClientBuildSnafu, LocationSource, ProviderError, ProviderInitError, SalesLedger,
        http::{get_json, normalize_base_url},
        ledger_rest::response::{UniqueDate, UniqueValue},
    },
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Client for the ledger's `/sales` and `/location` endpoints.
#[derive(Debug, Clone)]
pub struct LedgerRestProvider {
    client: Client,
    base_url: String,
}

impl LedgerRestProvider {
    /// Creates a client rooted at `server_link`, e.g. `http://ledger:5000/api`.
    pub fn new(server_link: &str) -> Result<Self, ProviderInitError> {
        let base_url = normalize_base_url(server_link)?;
        let client = Client::builder().build().context(ClientBuildSnafu)?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl SalesLedger for LedgerRestProvider {
    async fn distinct_count(&self, field: SalesField) -> Result<usize, ProviderError> {
        let url = self.url(&format!("sales/unique/{}", field.column()));
        let values: Vec<UniqueValue> = get_json(&self.client, &url, &[]).await?;
        Ok(values.len())
    }

    async fn sales_dates(&self) -> Result<Vec<NaiveDate>, ProviderError> {
        let url = self.url("sales/unique/date");
        let rows: Vec<UniqueDate> = get_json(&self.client, &url, &[]).await?;
        let mut dates: Vec<NaiveDate> = rows.into_iter().map(|r| r.date).collect();
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }

    async fn sales_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> Result<Vec<SalesRecord>, ProviderError> {
        let url = self.url("sales");
        let query = [("page", page.to_string()), ("pageSize", page_size.to_string())];
        get_json(&self.client, &url, &query).await
    }

    async fn sales_amounts(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        page_size: usize,
    ) -> Result<Vec<SalesAmount>, ProviderError> {
        let url = self.url("sales/amount");
        let query = [
            ("dateFrom", from.format(DATE_FORMAT).to_string()),
            ("dateTo", to.format(DATE_FORMAT).to_string()),
            ("pageSize", page_size.to_string()),
        ];
        get_json(&self.client, &url, &query).await
    }
}

#[async_trait]
impl LocationSource for LedgerRestProvider {
    async fn locations(&self) -> Result<Vec<Location>, ProviderError> {
        let url = self.url("location/all");
        get_json(&self.client, &url, &[]).await
    }
}
