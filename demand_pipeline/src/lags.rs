//! LagFeatureFetcher: one bulk fetch of the amounts that lag features read.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use demand_ingestor::{models::sales::SalesAmount, providers::SalesLedger};
use tracing::{info, warn};

use crate::{entity::EntityKey, error::PipelineError};

/// Inclusive date range of history needed for all lags of all prediction dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LagWindow {
    /// `start = min(dates) - max(lags)`, `end = max(dates) - min(lags)`.
    ///
    /// `None` when either input is empty.
    pub fn for_dates(dates: &[NaiveDate], lags: &[u32]) -> Option<Self> {
        let first = dates.iter().min()?;
        let last = dates.iter().max()?;
        let smallest = lags.iter().min()?;
        let largest = lags.iter().max()?;
        Some(Self {
            start: first.checked_sub_days(Days::new(u64::from(*largest)))?,
            end: last.checked_sub_days(Days::new(u64::from(*smallest)))?,
        })
    }

    pub fn days(&self) -> usize {
        usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// Amount history per entity, ascending by date.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LagFrame {
    history: HashMap<EntityKey, Vec<(NaiveDate, f64)>>,
}

impl LagFrame {
    /// Groups bulk amount rows by entity. A missing amount counts as zero sales.
    pub fn from_amounts(rows: Vec<SalesAmount>) -> Self {
        let mut history: HashMap<EntityKey, Vec<(NaiveDate, f64)>> = HashMap::new();
        for row in rows {
            history
                .entry(EntityKey::new(row.store, row.article))
                .or_default()
                .push((row.date, row.amount.unwrap_or(0.0)));
        }
        for rows in history.values_mut() {
            rows.sort_by_key(|(date, _)| *date);
        }
        Self { history }
    }

    pub fn history(&self, key: EntityKey) -> &[(NaiveDate, f64)] {
        self.history.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    /// The `lag_<lag>` column for an entity whose series has `target_dates`.
    ///
    /// The history ends `smallest` days before the last prediction date. The
    /// column for `lag` therefore starts `lag - smallest + duration` rows from
    /// the end of the history and runs for one row per target date.
    pub fn lag_column(
        &self,
        key: EntityKey,
        lag: u32,
        smallest: u32,
        duration: u32,
        target_dates: &[NaiveDate],
    ) -> Result<Vec<f64>, PipelineError> {
        let history = self.history(key);
        let offset = (lag.saturating_sub(smallest) + duration) as usize;
        let len = target_dates.len();
        if offset > history.len() || len > offset {
            return Err(PipelineError::LagHistory {
                entity: key,
                lag,
                needed: offset.max(len),
                available: history.len(),
            });
        }
        let start = history.len() - offset;
        let window = &history[start..start + len];

        let misaligned = window
            .iter()
            .zip(target_dates)
            .filter(|((date, _), target)| {
                date.checked_add_days(Days::new(u64::from(lag))) != Some(**target)
            })
            .count();
        if misaligned > 0 {
            warn!(entity = %key, lag, misaligned, "lag rows do not line up with prediction dates");
        }

        Ok(window.iter().map(|(_, amount)| *amount).collect())
    }
}

/// Fetches every amount in `window` in one request sized for `entity_count`
/// entities per day.
pub async fn fetch_lag_frame(
    ledger: &dyn SalesLedger,
    window: LagWindow,
    entity_count: usize,
) -> Result<LagFrame, PipelineError> {
    let page_size = entity_count * window.days();
    let rows = ledger
        .sales_amounts(window.start, window.end, page_size)
        .await?;
    info!(
        rows = rows.len(),
        from = %window.start,
        to = %window.end,
        "fetched lag history"
    );
    Ok(LagFrame::from_amounts(rows))
}
