//! Crop models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::weather::DailyWeather;
use crate::types::GpsCoordinates;

/// Per-variable sensitivity coefficients. Entries may be null.
pub type KValues = BTreeMap<String, Option<f64>>;

/// A cultivar/region entry and its optimal-growth weather profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Crop {
    /// Unique within a batch
    pub name: String,
    pub variety: String,
    pub region: String,
    pub coordinates: GpsCoordinates,
    /// 1 = January
    pub planting_season_month: u32,
    pub duration_days: usize,
    /// Populated by the weather provider; `None` when the fetch failed
    #[serde(default)]
    pub daily_weather: Option<Vec<DailyWeather>>,
    /// Populated by calibration
    #[serde(default)]
    pub k_values: Option<KValues>,
}

impl Crop {
    /// Historical records, empty when the crop was never enriched
    pub fn history(&self) -> &[DailyWeather] {
        self.daily_weather.as_deref().unwrap_or(&[])
    }

    pub fn has_weather(&self) -> bool {
        !self.history().is_empty()
    }

    /// Usable k value for a variable: present, non-null and finite
    pub fn k_value(&self, variable: &str) -> Option<f64> {
        self.k_values
            .as_ref()
            .and_then(|k| k.get(variable).copied().flatten())
            .filter(|k| k.is_finite())
    }

    /// Number of days a matching window spans for this crop
    pub fn window_length(&self) -> usize {
        match self.history().len() {
            0 => self.duration_days,
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn crop() -> Crop {
        Crop {
            name: "jasmine-rice".to_string(),
            variety: "KDML105".to_string(),
            region: "Isan".to_string(),
            coordinates: GpsCoordinates::new(Decimal::new(152, 1), Decimal::new(1040, 1)),
            planting_season_month: 7,
            duration_days: 120,
            daily_weather: None,
            k_values: None,
        }
    }

    #[test]
    fn test_k_value_ignores_null_and_non_finite() {
        let mut crop = crop();
        let mut k = KValues::new();
        k.insert("temperature_2m_max".to_string(), Some(0.8));
        k.insert("precipitation_sum".to_string(), None);
        k.insert("wind_speed_10m_max".to_string(), Some(f64::NAN));
        crop.k_values = Some(k);

        assert_eq!(crop.k_value("temperature_2m_max"), Some(0.8));
        assert_eq!(crop.k_value("precipitation_sum"), None);
        assert_eq!(crop.k_value("wind_speed_10m_max"), None);
        assert_eq!(crop.k_value("shortwave_radiation_sum"), None);
    }

    #[test]
    fn test_descriptor_without_weather_deserializes() {
        let json = r#"{
            "name": "cassava",
            "variety": "Kasetsart 50",
            "region": "Nakhon Ratchasima",
            "coordinates": {"latitude": "14.97", "longitude": "102.10"},
            "planting_season_month": 5,
            "duration_days": 240
        }"#;
        let crop: Crop = serde_json::from_str(json).unwrap();

        assert!(!crop.has_weather());
        assert!(crop.k_values.is_none());
        assert_eq!(crop.window_length(), 240);
    }
}
