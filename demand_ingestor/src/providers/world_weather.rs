//! Weather from worldweatheronline.com's premium API.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::WorldWeatherProvider;
