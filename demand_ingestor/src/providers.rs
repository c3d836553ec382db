//! Provider abstraction for the external data sources of a forecast run.
//!
//! Each upstream service is reached through one trait so the pipeline can be
//! driven by the REST clients in production and by in-memory fakes in tests:
//!
//! - [`SalesLedger`]: sales rows, distinct values and bulk amount windows.
//! - [`LocationSource`]: store addresses and coordinates.
//! - [`HolidaySource`] / [`VacationSource`]: bank holidays and school
//!   vacations per state and year.
//! - [`WeatherSource`]: historical and forecast weather per location.
//!
//! All traits are async and object safe, so callers hold them as
//! `Arc<dyn Trait>` and pick the implementation at runtime.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use demand_ingestor::models::location::Location;
//! use demand_ingestor::providers::{LocationSource, ProviderError};
//!
//! struct FixedLocations(Vec<Location>);
//!
//! #[async_trait]
//! impl LocationSource for FixedLocations {
//!     async fn locations(&self) -> Result<Vec<Location>, ProviderError> {
//!         Ok(self.0.clone())
//!     }
//! }
//! ```

pub mod holidays;
mod http;
pub mod ledger_rest;
pub mod vacations;
pub mod world_weather;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{
    calendar::{HolidayEntry, VacationRange},
    location::{LatLonKey, Location},
    sales::{SalesAmount, SalesField, SalesRecord},
    weather::WeatherDay,
};

/// Read access to the sales ledger service.
#[async_trait]
pub trait SalesLedger: Send + Sync {
    /// Number of distinct values of `field` across all sales.
    async fn distinct_count(&self, field: SalesField) -> Result<usize, ProviderError>;

    /// Every distinct sales date, ascending.
    async fn sales_dates(&self) -> Result<Vec<NaiveDate>, ProviderError>;

    /// One page of sales rows. Pages are numbered from 1.
    async fn sales_page(&self, page: u32, page_size: usize)
    -> Result<Vec<SalesRecord>, ProviderError>;

    /// All amounts dated within `from..=to`, in one response of at most `page_size` rows.
    async fn sales_amounts(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        page_size: usize,
    ) -> Result<Vec<SalesAmount>, ProviderError>;
}

/// Store locations.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn locations(&self) -> Result<Vec<Location>, ProviderError>;
}

/// Bank holidays for one state and year.
#[async_trait]
pub trait HolidaySource: Send + Sync {
    async fn bank_holidays(&self, state: &str, year: i32)
    -> Result<Vec<HolidayEntry>, ProviderError>;
}

/// School vacation ranges for one state and year.
#[async_trait]
pub trait VacationSource: Send + Sync {
    async fn school_vacations(
        &self,
        state: &str,
        year: i32,
    ) -> Result<Vec<VacationRange>, ProviderError>;
}

/// Daily weather for a rounded location.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Observed weather for `start..=end`.
    async fn historical(
        &self,
        location: LatLonKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeatherDay>, ProviderError>;

    /// Forecast for `days` days starting today.
    async fn forecast(&self, location: LatLonKey, days: u32)
    -> Result<Vec<WeatherDay>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The configured base URL cannot be used.
    #[snafu(display("Invalid base URL {url:?}: {message}"))]
    InvalidBaseUrl {
        url: String,
        message: String,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a provider implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request to {endpoint} failed: {source}"))]
    Reqwest {
        endpoint: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The service answered with a non-success status.
    #[snafu(display("API error {status} from {endpoint}: {message}"))]
    Api {
        endpoint: String,
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The body did not have the expected shape.
    #[snafu(display("Malformed response from {endpoint}: {message}"))]
    Parse {
        endpoint: String,
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

impl ProviderError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Parse { .. } | ProviderError::Reqwest { .. })
    }
}
