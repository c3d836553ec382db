//! Store locations and the rounded coordinate key used to share weather
//! lookups between nearby stores.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A store's address and coordinates as held by the ledger service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "filnr")]
    pub store: u32,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub zipcode: Option<u32>,
    #[serde(default)]
    pub city: Option<String>,
    /// ISO 3166-2 subdivision code without the country prefix, e.g. `BY`.
    pub state: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn latlon_key(&self) -> LatLonKey {
        LatLonKey::new(self.lat, self.lon)
    }
}

/// Coordinates rounded to two decimal places.
///
/// Stored as integer hundredths so that keys compare and hash exactly; the
/// weather provider resolves positions at this precision anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LatLonKey {
    lat_centi: i32,
    lon_centi: i32,
}

impl LatLonKey {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat_centi: (lat * 100.0).round() as i32,
            lon_centi: (lon * 100.0).round() as i32,
        }
    }

    pub fn lat(&self) -> f64 {
        f64::from(self.lat_centi) / 100.0
    }

    pub fn lon(&self) -> f64 {
        f64::from(self.lon_centi) / 100.0
    }
}

/// Renders as the `lat,lon` query the weather provider expects.
impl fmt::Display for LatLonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2},{:.2}", self.lat(), self.lon())
    }
}
