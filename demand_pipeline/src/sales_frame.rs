//! SalesFrameAssembler: the target rows of a forecast run.
//!
//! The ledger pages its sales by `page_size = distinct stores × distinct
//! articles`, so with rows ordered by date one page holds exactly one day of
//! every entity. The page of `start_date` is its position in the ledger's
//! sorted date list, plus one because pages are numbered from 1.

use chrono::NaiveDate;
use demand_ingestor::{
    models::sales::{SalesField, SalesRecord},
    providers::SalesLedger,
    requests::{paged::fetch_pages, retry::RetryPolicy},
};
use tracing::{info, warn};

use crate::error::PipelineError;

/// Rows to forecast, with their amounts blanked.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesFrame {
    pub rows: Vec<SalesRecord>,
    /// Distinct dates of `rows`, ascending.
    pub pred_dates: Vec<NaiveDate>,
    /// Rows per page, i.e. entities per day.
    pub page_size: usize,
}

pub struct SalesFrameAssembler<'a> {
    ledger: &'a dyn SalesLedger,
    max_concurrent_pages: usize,
}

impl<'a> SalesFrameAssembler<'a> {
    pub fn new(ledger: &'a dyn SalesLedger, max_concurrent_pages: usize) -> Self {
        Self {
            ledger,
            max_concurrent_pages,
        }
    }

    /// Fetches `duration` pages starting at the page of `start_date`.
    ///
    /// Pages are requested concurrently and each gets one retry. A failure
    /// that survives its retry cancels the rest and fails the assembly. An
    /// empty page is an error, a short one only a warning.
    pub async fn assemble(
        &self,
        start_date: NaiveDate,
        duration: u32,
    ) -> Result<SalesFrame, PipelineError> {
        let stores = self.ledger.distinct_count(SalesField::Store).await?;
        let articles = self.ledger.distinct_count(SalesField::Article).await?;
        let page_size = stores * articles;

        let dates = self.ledger.sales_dates().await?;
        let position = dates
            .iter()
            .position(|d| *d == start_date)
            .ok_or(PipelineError::StartDateNotFound { date: start_date })?;
        let first = u32::try_from(position + 1)
            .map_err(|_| PipelineError::Config(format!("page index of {start_date} overflows")))?;

        let ledger = self.ledger;
        let pages = fetch_pages(first..first + duration, self.max_concurrent_pages, |page| {
            RetryPolicy::ONCE.run("sales page", move || ledger.sales_page(page, page_size))
        })
        .await?;

        let mut rows = Vec::with_capacity(page_size * pages.len());
        for (page, page_rows) in pages {
            if page_rows.is_empty() {
                return Err(PipelineError::EmptyPage { page });
            }
            if page_rows.len() < page_size {
                warn!(page, rows = page_rows.len(), page_size, "short sales page");
            }
            rows.extend(page_rows);
        }
        for row in &mut rows {
            row.amount = None;
        }

        let mut pred_dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        pred_dates.sort_unstable();
        pred_dates.dedup();

        if let (Some(from), Some(to)) = (pred_dates.first(), pred_dates.last()) {
            info!(
                predictions = rows.len(),
                %from,
                %to,
                page_size,
                "sales frame assembled"
            );
        }

        Ok(SalesFrame {
            rows,
            pred_dates,
            page_size,
        })
    }
}
