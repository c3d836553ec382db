//! The table written back to the ledger's prediction endpoint.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fixed columns of a serialized [`PredictionRecord`]. Category names share
/// the same namespace and must avoid these.
pub const RECORD_COLUMNS: [&str; 7] = [
    "id",
    "filnr",
    "artnr",
    "date",
    "prediction",
    "base_value",
    "safetystock",
];

/// One explained forecast for one store, article and day.
///
/// `categories` holds the rounded attribution per configured explanation
/// category and is flattened into the record, so a category named `weather`
/// becomes a top-level `weather` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    #[serde(rename = "filnr")]
    pub store: u32,
    #[serde(rename = "artnr")]
    pub article: u32,
    pub date: NaiveDate,
    pub prediction: i64,
    pub base_value: i64,
    #[serde(flatten)]
    pub categories: IndexMap<String, i64>,
    #[serde(rename = "safetystock")]
    pub safety_stock: i64,
}
