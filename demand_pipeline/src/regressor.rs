//! Per-entity regression capabilities and the registry they are loaded into.
//!
//! Models are fitted elsewhere. A run only needs two things from one: a point
//! prediction for a feature vector, and an additive attribution of that
//! prediction to the features. [`RegressionCapability`] is that seam; each
//! model family in the artifact implements it.

use std::{collections::HashMap, fmt, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{entity::EntityKey, error::PipelineError};

/// Additive explanation of one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    /// Model output with no feature information (expected value).
    pub base_value: f64,
    /// One value per input feature, in input order.
    pub attributions: Vec<f64>,
}

pub trait RegressionCapability: Send + Sync + fmt::Debug {
    fn predict(&self, features: &[f64]) -> Result<f64, PipelineError>;

    /// Attributes the model output for `features` to each feature.
    ///
    /// `target` is the prediction being explained; families whose attribution
    /// does not depend on it ignore it.
    fn explain(&self, features: &[f64], target: f64) -> Result<Explanation, PipelineError>;
}

/// `y = intercept + Σ cᵢ·xᵢ`, with the training means of each feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    /// Mean of each feature over the training data.
    pub means: Vec<f64>,
}

impl LinearModel {
    fn check(&self, features: &[f64]) -> Result<(), PipelineError> {
        if features.len() != self.coefficients.len() {
            return Err(PipelineError::ModelShape {
                expected: self.coefficients.len(),
                got: features.len(),
            });
        }
        Ok(())
    }
}

impl RegressionCapability for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<f64, PipelineError> {
        self.check(features)?;
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }

    // Exact Shapley values for independent features:
    // base = intercept + Σ cᵢ·μᵢ and φᵢ = cᵢ·(xᵢ - μᵢ).
    fn explain(&self, features: &[f64], _target: f64) -> Result<Explanation, PipelineError> {
        self.check(features)?;
        let base_value = self.intercept
            + self
                .coefficients
                .iter()
                .zip(&self.means)
                .map(|(c, m)| c * m)
                .sum::<f64>();
        let attributions = self
            .coefficients
            .iter()
            .zip(&self.means)
            .zip(features)
            .map(|((c, m), x)| c * (x - m))
            .collect();
        Ok(Explanation {
            base_value,
            attributions,
        })
    }
}

/// Model families an artifact can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear(LinearModel),
}

impl ModelSpec {
    fn into_capability(self) -> Result<Arc<dyn RegressionCapability>, String> {
        match self {
            ModelSpec::Linear(m) => {
                if m.means.len() != m.coefficients.len() {
                    return Err(format!(
                        "{} coefficients but {} means",
                        m.coefficients.len(),
                        m.means.len()
                    ));
                }
                Ok(Arc::new(m))
            }
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct RegistryEntry {
    store: u32,
    article: u32,
    model: ModelSpec,
}

/// Fitted models keyed by entity.
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    models: HashMap<EntityKey, Arc<dyn RegressionCapability>>,
}

impl ModelRegistry {
    /// Parses `[{"store": .., "article": .., "model": {"family": "linear", ..}}]`.
    pub fn from_json_str(s: &str) -> Result<Self, PipelineError> {
        let entries: Vec<RegistryEntry> = serde_json::from_str(s)?;
        let mut registry = Self::default();
        for entry in entries {
            let key = EntityKey::new(entry.store, entry.article);
            let model = entry
                .model
                .into_capability()
                .map_err(|e| PipelineError::Config(format!("model for {key}: {e}")))?;
            if registry.models.insert(key, model).is_some() {
                return Err(PipelineError::Config(format!("{key} has more than one model")));
            }
        }
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn insert(&mut self, key: EntityKey, model: Arc<dyn RegressionCapability>) {
        self.models.insert(key, model);
    }

    pub fn get(&self, key: EntityKey) -> Option<&dyn RegressionCapability> {
        self.models.get(&key).map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
