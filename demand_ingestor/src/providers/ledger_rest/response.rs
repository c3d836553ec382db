use chrono::NaiveDate;
use serde::Deserialize;

use crate::utils::dates::deserialize_date;

/// Element of `GET /sales/unique/date`.
#[derive(Deserialize, Debug)]
pub struct UniqueDate {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
}

/// Element of `GET /sales/unique/{field}`; only the count matters, so the
/// value itself is left undecoded.
pub type UniqueValue = serde_json::Map<String, serde_json::Value>;
