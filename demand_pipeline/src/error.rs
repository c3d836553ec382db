use chrono::NaiveDate;
use demand_ingestor::providers::ProviderError;
use thiserror::Error;

use crate::entity::EntityKey;

/// Everything that can abort a forecast run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("no location known for store {store}")]
    MissingLocation { store: u32 },

    #[error("no regression model for {entity}")]
    MissingModel { entity: EntityKey },

    #[error("no safety factor for {entity}")]
    MissingSafetyFactor { entity: EntityKey },

    #[error("{entity} has more than one row dated {date}")]
    DuplicateDate { entity: EntityKey, date: NaiveDate },

    #[error("{entity}: lag_{lag} needs {needed} rows of history, {available} available")]
    LagHistory {
        entity: EntityKey,
        lag: u32,
        needed: usize,
        available: usize,
    },

    #[error("feature lag_{0} has no configured lag")]
    UnknownLagColumn(u32),

    #[error("model expects {expected} features, got {got}")]
    ModelShape { expected: usize, got: usize },

    #[error("sales page {page} is empty")]
    EmptyPage { page: u32 },

    #[error("start date {date} is not a sales date in the ledger")]
    StartDateNotFound { date: NaiveDate },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
