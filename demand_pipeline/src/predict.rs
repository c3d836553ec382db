//! Predictor: applies each entity's model to its feature matrix.

use tracing::warn;

use crate::{
    config::MissingModelPolicy,
    entity::EntityKey,
    error::PipelineError,
    features::{EntityFeatures, Feature, FeatureRow},
    regressor::ModelRegistry,
};

/// Rounds half to even (banker's rounding), so 2.5 becomes 2 and 3.5 becomes 4.
pub fn round_half_even(x: f64) -> f64 {
    x.round_ties_even()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictedRow {
    pub row: FeatureRow,
    /// Model input, in configured feature order.
    pub inputs: Vec<f64>,
    /// Rounded and never negative.
    pub prediction: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictedEntity {
    pub key: EntityKey,
    pub rows: Vec<PredictedRow>,
}

pub struct Predictor<'a> {
    registry: &'a ModelRegistry,
    features: &'a [Feature],
    policy: MissingModelPolicy,
}

impl<'a> Predictor<'a> {
    pub fn new(
        registry: &'a ModelRegistry,
        features: &'a [Feature],
        policy: MissingModelPolicy,
    ) -> Self {
        Self {
            registry,
            features,
            policy,
        }
    }

    /// `Ok(None)` when the entity has no model and the policy is to skip it.
    pub fn predict(
        &self,
        entity: EntityFeatures,
    ) -> Result<Option<PredictedEntity>, PipelineError> {
        let Some(model) = self.registry.get(entity.key) else {
            return match self.policy {
                MissingModelPolicy::Skip => {
                    warn!(entity = %entity.key, "no regression model, entity skipped");
                    Ok(None)
                }
                MissingModelPolicy::Abort => {
                    Err(PipelineError::MissingModel { entity: entity.key })
                }
            };
        };

        let rows = entity
            .rows
            .into_iter()
            .map(|row| {
                let inputs = row.vector(self.features)?;
                let raw = model.predict(&inputs)?;
                let prediction = round_half_even(raw).max(0.0) as i64;
                Ok::<_, PipelineError>(PredictedRow {
                    row,
                    inputs,
                    prediction,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(PredictedEntity {
            key: entity.key,
            rows,
        }))
    }
}
