//! Wire models and clients for the external services the demand forecast
//! consumes: the sales ledger, store locations, bank holidays, school
//! vacations and weather.

pub mod io;
pub mod models;
pub mod providers;
pub mod requests;
pub mod utils;
