//! EntityPartitioner: one series per (store, article).

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use demand_ingestor::models::sales::SalesRecord;
use tracing::debug;

use crate::{
    entity::{EntityKey, EntitySeries, SeriesRow},
    error::PipelineError,
};

pub struct EntityPartitioner {
    excluded_stores: BTreeSet<u32>,
}

impl EntityPartitioner {
    pub fn new(excluded_stores: impl IntoIterator<Item = u32>) -> Self {
        Self {
            excluded_stores: excluded_stores.into_iter().collect(),
        }
    }

    /// Groups `rows` by entity, ordered by store then article.
    ///
    /// Rows of excluded stores are dropped. Each row gains its weekday and
    /// month; a missing discount becomes 0.
    pub fn partition(
        &self,
        rows: Vec<SalesRecord>,
    ) -> Result<BTreeMap<EntityKey, EntitySeries>, PipelineError> {
        let mut grouped: BTreeMap<EntityKey, Vec<SeriesRow>> = BTreeMap::new();
        let mut dropped = 0usize;
        for row in rows {
            if self.excluded_stores.contains(&row.store) {
                dropped += 1;
                continue;
            }
            grouped
                .entry(EntityKey::new(row.store, row.article))
                .or_default()
                .push(SeriesRow {
                    id: row.id,
                    date: row.date,
                    discount: row.discount.unwrap_or(0),
                    amount: row.amount,
                    weekday: row.date.weekday().num_days_from_monday(),
                    month: row.date.month(),
                });
        }
        debug!(entities = grouped.len(), dropped, "sales partitioned");

        grouped
            .into_iter()
            .map(|(key, rows)| Ok::<_, PipelineError>((key, EntitySeries::new(key, rows)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(id: i64, store: u32, article: u32, day: u32) -> SalesRecord {
        SalesRecord {
            id,
            store,
            article,
            discount: None,
            date: NaiveDate::from_ymd_opt(2023, 6, day).unwrap(),
            amount: None,
        }
    }

    #[test]
    fn groups_by_entity_and_drops_excluded_store() {
        let rows = vec![
            record(1, 1, 100, 6),
            record(2, 10, 100, 5),
            record(3, 1, 100, 5),
            record(4, 2, 100, 5),
        ];
        let series = EntityPartitioner::new([10]).partition(rows).unwrap();
        assert_eq!(series.len(), 2);
        let s = &series[&EntityKey::new(1, 100)];
        assert_eq!(s.rows()[0].id, 3);
        // 2023-06-05 was a Monday
        assert_eq!(s.rows()[0].weekday, 0);
        assert_eq!(s.rows()[1].weekday, 1);
        assert_eq!(s.rows()[0].month, 6);
        assert_eq!(s.rows()[0].discount, 0);
        assert!(!series.contains_key(&EntityKey::new(10, 100)));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let rows = vec![record(1, 1, 100, 5), record(2, 1, 100, 5)];
        assert!(matches!(
            EntityPartitioner::new([10]).partition(rows),
            Err(PipelineError::DuplicateDate { .. })
        ));
    }
}
