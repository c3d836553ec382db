//! Writes predictions back to the ledger service.
//!
//! The service keeps a single prediction set: `DELETE /prediction` clears it
//! and `POST /prediction` stores the new one.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Response;
use snafu::ResultExt;
use tracing::info;

use crate::{
    io::sink::{EncodeSnafu, IoSnafu, PredictionSink, SinkError, TransportSnafu, WriteSnafu},
    models::prediction::PredictionRecord,
    providers::ledger_rest::LedgerRestProvider,
};

/// Sink backed by the ledger's `/prediction` endpoint.
pub struct LedgerPredictionSink {
    ledger: LedgerRestProvider,
}

impl LedgerPredictionSink {
    pub fn new(ledger: LedgerRestProvider) -> Self {
        Self { ledger }
    }

    fn endpoint(&self) -> String {
        format!("{}/prediction", self.ledger.base_url())
    }
}

async fn ensure_success(response: Response, target: &str) -> Result<(), SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    WriteSnafu {
        target,
        message: format!("status {status}: {body}"),
    }
    .fail()
}

#[async_trait]
impl PredictionSink for LedgerPredictionSink {
    type Output = usize;

    async fn replace(&self, records: &[PredictionRecord]) -> Result<usize, SinkError> {
        let target = self.endpoint();
        let client = self.ledger.client();

        let deleted = client
            .delete(&target)
            .send()
            .await
            .context(TransportSnafu { target: &target })?;
        ensure_success(deleted, &target).await?;

        let body = serde_json::to_vec(records).context(EncodeSnafu)?;
        let posted = client
            .post(&target)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .context(TransportSnafu { target: &target })?;
        ensure_success(posted, &target).await?;

        info!(records = records.len(), %target, "replaced stored predictions");
        Ok(records.len())
    }
}

/// Sink writing the records as a pretty-printed JSON array.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PredictionSink for JsonFileSink {
    type Output = PathBuf;

    async fn replace(&self, records: &[PredictionRecord]) -> Result<PathBuf, SinkError> {
        let body = serde_json::to_vec_pretty(records).context(EncodeSnafu)?;
        tokio::fs::write(&self.path, body).await.context(IoSnafu)?;
        info!(records = records.len(), path = %self.path.display(), "wrote predictions");
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    use super::*;

    #[tokio::test]
    async fn file_sink_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.json");
        tokio::fs::write(&path, b"stale").await.unwrap();

        let record = PredictionRecord {
            id: 1,
            store: 4,
            article: 100,
            date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            prediction: 12,
            base_value: 9,
            categories: IndexMap::from([("weather".to_string(), 3)]),
            safety_stock: 3,
        };
        let written = JsonFileSink::new(&path).replace(&[record]).await.unwrap();
        let text = tokio::fs::read_to_string(&written).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["filnr"], 4);
        assert_eq!(value[0]["weather"], 3);
    }

    #[test]
    fn endpoint_is_rooted_at_the_ledger() {
        let ledger = LedgerRestProvider::new("http://ledger:5000/api").unwrap();
        let sink = LedgerPredictionSink::new(ledger);
        assert_eq!(sink.endpoint(), "http://ledger:5000/api/prediction");
    }
}
