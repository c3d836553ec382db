//! Safety-factor table: `filnr,artnr,seo_factor` per entity.

use std::{collections::HashMap, io, path::Path};

use serde::Deserialize;

use crate::{entity::EntityKey, error::PipelineError, predict::round_half_even};

#[derive(Debug, Deserialize)]
struct SafetyRow {
    filnr: u32,
    artnr: u32,
    seo_factor: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SafetyFactors {
    factors: HashMap<EntityKey, f64>,
}

impl SafetyFactors {
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, PipelineError> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut factors = HashMap::new();
        for row in csv.deserialize() {
            let row: SafetyRow = row?;
            factors.insert(EntityKey::new(row.filnr, row.artnr), row.seo_factor);
        }
        Ok(Self { factors })
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    pub fn factor(&self, key: EntityKey) -> Option<f64> {
        self.factors.get(&key).copied()
    }

    /// `round(factor × prediction)`. There is no default factor.
    pub fn safety_stock(&self, key: EntityKey, prediction: i64) -> Result<i64, PipelineError> {
        let factor = self
            .factor(key)
            .ok_or(PipelineError::MissingSafetyFactor { entity: key })?;
        Ok(round_half_even(factor * prediction as f64) as i64)
    }
}

impl FromIterator<(EntityKey, f64)> for SafetyFactors {
    fn from_iter<I: IntoIterator<Item = (EntityKey, f64)>>(iter: I) -> Self {
        Self {
            factors: iter.into_iter().collect(),
        }
    }
}
