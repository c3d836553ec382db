//! Feature fusion and forecast finalization for per-store, per-article demand.
//!
//! A run flows through these stages, each in its own module:
//!
//! 1. [`sales_frame`]: fetch the target-date sales pages.
//! 2. [`partition`]: split them into one series per (store, article).
//! 3. [`lags`], [`calendar`], [`weather`]: gather lag history, holidays and
//!    vacations, and weather.
//! 4. [`features`]: join everything onto each series.
//! 5. [`predict`] and [`explain`]: apply the entity's model and attribute
//!    the result to categories.
//!
//! [`pipeline::run`] drives all of them against a [`context::RunContext`].

pub mod bucket;
pub mod calendar;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod explain;
pub mod features;
pub mod lags;
pub mod partition;
pub mod pipeline;
pub mod predict;
pub mod regressor;
pub mod safety;
pub mod sales_frame;
pub mod tz;
pub mod weather;

pub use error::PipelineError;
