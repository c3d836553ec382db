pub mod calendar;
pub mod location;
pub mod prediction;
pub mod sales;
pub mod weather;
