#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use demand_ingestor::{
    models::sales::{SalesAmount, SalesField, SalesRecord},
    providers::{ParseSnafu, ProviderError, SalesLedger},
};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// In-memory ledger holding full rows ordered by (date, store, article).
pub struct MemoryLedger {
    pub rows: Vec<SalesRecord>,
    /// Pages that fail with a parse error on their first request.
    pub flaky_pages: Mutex<Vec<u32>>,
    pub page_calls: Mutex<Vec<u32>>,
}

impl MemoryLedger {
    pub fn new(stores: &[u32], articles: &[u32], dates: &[NaiveDate]) -> Self {
        let mut rows = Vec::new();
        let mut id = 0;
        for date in dates {
            for store in stores {
                for article in articles {
                    id += 1;
                    rows.push(SalesRecord {
                        id,
                        store: *store,
                        article: *article,
                        discount: Some(0),
                        date: *date,
                        amount: Some(id as f64),
                    });
                }
            }
        }
        Self {
            rows,
            flaky_pages: Mutex::new(Vec::new()),
            page_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SalesLedger for MemoryLedger {
    async fn distinct_count(&self, field: SalesField) -> Result<usize, ProviderError> {
        let mut values: Vec<String> = self
            .rows
            .iter()
            .map(|r| match field {
                SalesField::Store => r.store.to_string(),
                SalesField::Article => r.article.to_string(),
                SalesField::Date => r.date.to_string(),
            })
            .collect();
        values.sort();
        values.dedup();
        Ok(values.len())
    }

    async fn sales_dates(&self) -> Result<Vec<NaiveDate>, ProviderError> {
        let mut dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }

    async fn sales_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> Result<Vec<SalesRecord>, ProviderError> {
        self.page_calls.lock().unwrap().push(page);
        {
            let mut flaky = self.flaky_pages.lock().unwrap();
            if let Some(pos) = flaky.iter().position(|p| *p == page) {
                flaky.remove(pos);
                return ParseSnafu { endpoint: "/sales", message: "truncated body" }.fail();
            }
        }
        let start = (page as usize - 1) * page_size;
        Ok(self.rows.iter().skip(start).take(page_size).cloned().collect())
    }

    async fn sales_amounts(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        page_size: usize,
    ) -> Result<Vec<SalesAmount>, ProviderError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.date >= from && r.date <= to)
            .take(page_size)
            .map(|r| SalesAmount {
                id: r.id,
                store: r.store,
                article: r.article,
                date: r.date,
                amount: r.amount,
            })
            .collect())
    }
}
