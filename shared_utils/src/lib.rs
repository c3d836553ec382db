//! Small helpers shared by the forecasting crates: environment lookup and
//! TOML file loading.

pub mod config;
pub mod env;
