//! Rows served by the sales ledger.
//!
//! The ledger speaks the store/article vocabulary of its database schema
//! (`filnr`, `artnr`); the Rust side uses `store` and `article`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::dates::deserialize_date;

/// One day of sales for one store and article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub id: i64,
    #[serde(rename = "filnr")]
    pub store: u32,
    #[serde(rename = "artnr")]
    pub article: u32,
    /// Discount flag/amount active that day. The ledger allows nulls.
    #[serde(default)]
    pub discount: Option<i64>,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    /// Sold quantity. `None` marks a row whose amount is the forecast target.
    #[serde(default)]
    pub amount: Option<f64>,
}

/// The reduced row returned by the amount-range endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesAmount {
    pub id: i64,
    #[serde(rename = "filnr")]
    pub store: u32,
    #[serde(rename = "artnr")]
    pub article: u32,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Columns the ledger can list distinct values for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesField {
    Store,
    Article,
    Date,
}

impl SalesField {
    /// Column name in the ledger's schema.
    pub fn column(self) -> &'static str {
        match self {
            SalesField::Store => "filnr",
            SalesField::Article => "artnr",
            SalesField::Date => "date",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ledger_row() {
        let raw = r#"{"id": 12, "filnr": 3, "artnr": 80028349, "discount": 0,
                      "date": "2023-06-30", "amount": 41, "prediction": null}"#;
        let rec: SalesRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.store, 3);
        assert_eq!(rec.article, 80028349);
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());
        assert_eq!(rec.amount, Some(41.0));
    }

    #[test]
    fn nullable_columns_default_to_none() {
        let raw = r#"{"id": 1, "filnr": 1, "artnr": 2, "date": "2023-01-02T00:00:00"}"#;
        let rec: SalesRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.discount, None);
        assert_eq!(rec.amount, None);
    }
}
