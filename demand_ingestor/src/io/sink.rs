use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::prediction::PredictionRecord;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// The destination rejected or failed the write.
    #[snafu(display("Failed to write predictions to {target}: {message}"))]
    Write {
        target: String,
        message: String,
        backtrace: Backtrace,
    },

    /// The request never reached the destination.
    #[snafu(display("Request to {target} failed: {source}"))]
    Transport {
        target: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Predictions could not be encoded for the destination.
    #[snafu(display("Failed to encode predictions: {source}"))]
    Encode {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// A generic I/O error.
    #[snafu(display("I/O error: {source}"))]
    Io {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

#[async_trait]
pub trait PredictionSink: Send + Sync {
    /// The type of output returned after a successful write operation.
    ///
    /// The REST sink reports the number of records posted; a file sink
    /// returns the path it wrote.
    type Output;

    /// Replaces whatever the destination holds with `records`.
    async fn replace(&self, records: &[PredictionRecord]) -> Result<Self::Output, SinkError>;
}
