//! The unit of independent forecasting: one (store, article) pair and its
//! date-ordered rows.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub store: u32,
    pub article: u32,
}

impl EntityKey {
    pub const fn new(store: u32, article: u32) -> Self {
        Self { store, article }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store {} article {}", self.store, self.article)
    }
}

/// One sales row of an entity. Store and article live on the owning series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub id: i64,
    pub date: NaiveDate,
    pub discount: i64,
    pub amount: Option<f64>,
    /// Monday = 0.
    pub weekday: u32,
    /// 1..=12
    pub month: u32,
}

/// Rows of one entity, strictly increasing by date.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySeries {
    key: EntityKey,
    rows: Vec<SeriesRow>,
}

impl EntitySeries {
    /// Sorts `rows` by date and rejects repeated dates.
    pub fn new(key: EntityKey, mut rows: Vec<SeriesRow>) -> Result<Self, PipelineError> {
        rows.sort_by_key(|r| r.date);
        if let Some(pair) = rows.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(PipelineError::DuplicateDate {
                entity: key,
                date: pair[0].date,
            });
        }
        Ok(Self { key, rows })
    }

    pub fn key(&self) -> EntityKey {
        self.key
    }

    pub fn rows(&self) -> &[SeriesRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }
}
