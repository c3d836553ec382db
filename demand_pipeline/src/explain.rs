//! ExplainFinalizer: turns predictions into the output table.
//!
//! Each row gets the model's base value, one rounded attribution per
//! configured category, and a safety stock. The run also reports the mean
//! prediction per article across stores.

use std::collections::BTreeMap;

use demand_ingestor::models::prediction::PredictionRecord;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::{
    error::PipelineError,
    predict::{PredictedEntity, round_half_even},
    regressor::ModelRegistry,
    safety::SafetyFactors,
};

/// Rounded sum of the attributions at `members`.
pub fn category_sum(attributions: &[f64], members: &[usize]) -> i64 {
    let sum: f64 = members.iter().filter_map(|i| attributions.get(*i)).sum();
    round_half_even(sum) as i64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSummary {
    pub article: u32,
    pub mean_prediction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finalized {
    pub records: Vec<PredictionRecord>,
    /// Ascending by article.
    pub summary: Vec<ArticleSummary>,
}

pub struct ExplainFinalizer<'a> {
    registry: &'a ModelRegistry,
    safety: &'a SafetyFactors,
    categories: &'a IndexMap<String, Vec<usize>>,
}

impl<'a> ExplainFinalizer<'a> {
    pub fn new(
        registry: &'a ModelRegistry,
        safety: &'a SafetyFactors,
        categories: &'a IndexMap<String, Vec<usize>>,
    ) -> Self {
        Self {
            registry,
            safety,
            categories,
        }
    }

    pub fn finalize(&self, entities: &[PredictedEntity]) -> Result<Finalized, PipelineError> {
        let mut records = Vec::new();
        for entity in entities {
            let model = self
                .registry
                .get(entity.key)
                .ok_or(PipelineError::MissingModel { entity: entity.key })?;
            for predicted in &entity.rows {
                let explanation = model.explain(&predicted.inputs, predicted.prediction as f64)?;
                let categories = self
                    .categories
                    .iter()
                    .map(|(name, members)| {
                        (name.clone(), category_sum(&explanation.attributions, members))
                    })
                    .collect();
                records.push(PredictionRecord {
                    id: predicted.row.id,
                    store: entity.key.store,
                    article: entity.key.article,
                    date: predicted.row.date,
                    prediction: predicted.prediction,
                    base_value: explanation.base_value.trunc() as i64,
                    categories,
                    safety_stock: self.safety.safety_stock(entity.key, predicted.prediction)?,
                });
            }
        }

        let summary = summarize(&records);
        if !records.is_empty() {
            let n = records.len() as f64;
            let mean_prediction = records.iter().map(|r| r.prediction as f64).sum::<f64>() / n;
            let mean_safety = records.iter().map(|r| r.safety_stock as f64).sum::<f64>() / n;
            info!(
                mean_prediction = format_args!("{mean_prediction:.2}"),
                mean_safety_stock = format_args!("{mean_safety:.2}"),
                "predictions finalized"
            );
        }
        Ok(Finalized { records, summary })
    }
}

/// Mean prediction per article across all stores.
pub fn summarize(records: &[PredictionRecord]) -> Vec<ArticleSummary> {
    let mut totals: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for r in records {
        let entry = totals.entry(r.article).or_default();
        entry.0 += r.prediction as f64;
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(article, (sum, count))| ArticleSummary {
            article,
            mean_prediction: sum / count as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap as Map, sync::Arc};

    use chrono::NaiveDate;
    use demand_ingestor::models::weather::WeatherDay;

    use super::*;
    use crate::{
        entity::EntityKey,
        features::FeatureRow,
        predict::PredictedRow,
        regressor::LinearModel,
    };

    #[test]
    fn category_sum_rounds_once() {
        assert_eq!(category_sum(&[1.4, 1.4, 1.2, 9.0], &[0, 1, 2]), 4);
        assert_eq!(category_sum(&[0.5, 2.0], &[0, 1]), 2);
        assert_eq!(category_sum(&[1.0], &[]), 0);
    }

    fn predicted(key: EntityKey, inputs: Vec<f64>, prediction: i64) -> PredictedEntity {
        let date = NaiveDate::from_ymd_opt(2023, 6, 5).unwrap();
        PredictedEntity {
            key,
            rows: vec![PredictedRow {
                row: FeatureRow {
                    id: 77,
                    date,
                    discount: 0,
                    weekday: 0,
                    month: 6,
                    datecode: 0,
                    lags: Map::new(),
                    weather: WeatherDay {
                        date,
                        sun_hours: 0.0,
                        weather_code: 0.0,
                        feels_like: 0.0,
                        heat_index: 0.0,
                    },
                },
                inputs,
                prediction,
            }],
        }
    }

    #[test]
    fn records_carry_categories_and_safety_stock() {
        let key = EntityKey::new(1, 100);
        let mut registry = ModelRegistry::default();
        registry.insert(
            key,
            Arc::new(LinearModel {
                intercept: 10.0,
                coefficients: vec![1.0, 2.0, 3.0],
                means: vec![0.0, 1.0, 1.0],
            }),
        );
        let safety: SafetyFactors = [(key, 0.25)].into_iter().collect();
        let categories = IndexMap::from([
            ("dayspecific".to_string(), vec![0]),
            ("weather".to_string(), vec![1, 2]),
        ]);
        // y = 10 + 4 + 4 + 6 = 24, base = 10 + 2 + 3 = 15
        let entity = predicted(key, vec![4.0, 2.0, 2.0], 24);

        let out = ExplainFinalizer::new(&registry, &safety, &categories)
            .finalize(&[entity])
            .unwrap();
        let rec = &out.records[0];
        assert_eq!(rec.id, 77);
        assert_eq!(rec.base_value, 15);
        assert_eq!(rec.categories["dayspecific"], 4);
        assert_eq!(rec.categories["weather"], 5);
        assert_eq!(rec.safety_stock, 6);
        assert_eq!(out.summary, vec![ArticleSummary { article: 100, mean_prediction: 24.0 }]);
    }

    #[test]
    fn missing_safety_factor_fails_finalization() {
        let key = EntityKey::new(1, 100);
        let mut registry = ModelRegistry::default();
        registry.insert(
            key,
            Arc::new(LinearModel { intercept: 0.0, coefficients: vec![1.0], means: vec![0.0] }),
        );
        let err = ExplainFinalizer::new(&registry, &SafetyFactors::default(), &IndexMap::new())
            .finalize(&[predicted(key, vec![3.0], 3)])
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingSafetyFactor { .. }));
    }

    #[test]
    fn summary_averages_across_stores() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 5).unwrap();
        let rec = |store, article, prediction| PredictionRecord {
            id: 0,
            store,
            article,
            date,
            prediction,
            base_value: 0,
            categories: IndexMap::new(),
            safety_stock: 0,
        };
        let summary = summarize(&[rec(1, 200, 4), rec(2, 200, 7), rec(1, 100, 3)]);
        assert_eq!(summary[0], ArticleSummary { article: 100, mean_prediction: 3.0 });
        assert_eq!(summary[1], ArticleSummary { article: 200, mean_prediction: 5.5 });
    }
}
