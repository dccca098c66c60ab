//! Common types used across the engine

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// GPS coordinates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl GpsCoordinates {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for GpsCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Daily weather variables recognized by default
pub mod variables {
    pub const TEMPERATURE_MAX: &str = "temperature_2m_max";
    pub const TEMPERATURE_MIN: &str = "temperature_2m_min";
    pub const PRECIPITATION_SUM: &str = "precipitation_sum";
    pub const RELATIVE_HUMIDITY_MEAN: &str = "relative_humidity_2m_mean";
    pub const WIND_SPEED_MAX: &str = "wind_speed_10m_max";
    pub const SHORTWAVE_RADIATION_SUM: &str = "shortwave_radiation_sum";

    /// Default variable set, in reporting order
    pub const DEFAULT_DAILY: [&str; 6] = [
        TEMPERATURE_MAX,
        TEMPERATURE_MIN,
        PRECIPITATION_SUM,
        RELATIVE_HUMIDITY_MEAN,
        WIND_SPEED_MAX,
        SHORTWAVE_RADIATION_SUM,
    ];
}
