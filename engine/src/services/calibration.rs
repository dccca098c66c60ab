//! k value calibration from a crop's historical weather profile
//!
//! Variables that swing widely over the growing season are discounted:
//! `k = base_importance * max(0.1, 1 - 0.5 * normalized_range)`.

use std::collections::BTreeMap;

use chrono::Utc;
use shared::{
    series_has_variable, sorted_by_date, valid_values, CalibrationEntry, CalibrationLog,
    CalibrationOutcome, CalibrationStatus, CalibrationSummary, Crop, KValues, LogError,
};

use crate::error::{EngineError, EngineResult};

/// Floor of the variation factor
pub const MIN_VARIATION_FACTOR: f64 = 0.1;

/// Range reported for constant series and series without a valid value
pub const DEGENERATE_RANGE: f64 = 1.0;

/// Observed spread of one variable over a crop's history
#[derive(Debug, Clone, Copy, PartialEq)]
struct VariableRange {
    range: f64,
    degenerate: bool,
}

fn variable_range(values: &[f64]) -> VariableRange {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if values.is_empty() || max == min {
        VariableRange {
            range: DEGENERATE_RANGE,
            degenerate: true,
        }
    } else {
        VariableRange {
            range: max - min,
            degenerate: false,
        }
    }
}

pub fn variation_factor(normalized_range: f64) -> f64 {
    (1.0 - 0.5 * normalized_range).max(MIN_VARIATION_FACTOR)
}

fn finite(importance: Option<f64>) -> Option<f64> {
    importance.filter(|v| v.is_finite())
}

/// Calibration of a single crop
#[derive(Debug, Clone)]
struct CropCalibration {
    crop: Crop,
    entries: Vec<CalibrationEntry>,
    error: Option<LogError>,
}

/// Compute k values for every crop with a historical profile.
///
/// Crops without weather data are returned untouched and reported in the log.
/// A calibrated crop's `k_values` is replaced with one entry per variable of
/// `base_importance`.
pub fn compute_k_values(
    crops: &[Crop],
    base_importance: &BTreeMap<String, f64>,
) -> EngineResult<CalibrationOutcome> {
    if crops.is_empty() {
        return Err(EngineError::NoCrops);
    }
    if base_importance.is_empty() {
        return Err(EngineError::InvalidConfig(
            "base_importance must name at least one variable".to_string(),
        ));
    }

    let started_at = Utc::now();
    tracing::info!(
        crops = crops.len(),
        variables = base_importance.len(),
        "Starting k value calibration"
    );

    let mut summary = CalibrationSummary {
        total_crops: crops.len(),
        ..CalibrationSummary::default()
    };
    let mut calibrated = Vec::with_capacity(crops.len());
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    for run in crops.iter().map(|crop| calibrate_crop(crop, base_importance)) {
        match run.error {
            Some(error) => {
                summary.crops_skipped += 1;
                errors.push(error);
            }
            None => summary.crops_calibrated += 1,
        }
        for entry in &run.entries {
            match entry.status {
                CalibrationStatus::Computed { .. } => summary.variables_computed += 1,
                CalibrationStatus::MissingFromData { .. } => summary.variables_missing += 1,
            }
        }
        entries.extend(run.entries);
        calibrated.push(run.crop);
    }

    tracing::info!(
        crops_calibrated = summary.crops_calibrated,
        crops_skipped = summary.crops_skipped,
        variables_missing = summary.variables_missing,
        "Calibration finished"
    );

    Ok(CalibrationOutcome {
        crops: calibrated,
        log: CalibrationLog {
            started_at,
            finished_at: Utc::now(),
            summary,
            entries,
            errors,
        },
    })
}

fn calibrate_crop(crop: &Crop, base_importance: &BTreeMap<String, f64>) -> CropCalibration {
    if !crop.has_weather() {
        tracing::error!(crop = %crop.name, "Cannot calibrate crop without weather data");
        return CropCalibration {
            crop: crop.clone(),
            entries: Vec::new(),
            error: Some(LogError::crop(
                &crop.name,
                "no daily weather data, k values not computed",
            )),
        };
    }

    let history = sorted_by_date(crop.history());

    let ranges: BTreeMap<&str, VariableRange> = base_importance
        .keys()
        .filter(|variable| series_has_variable(&history, variable))
        .map(|variable| {
            (
                variable.as_str(),
                variable_range(&valid_values(&history, variable)),
            )
        })
        .collect();

    let max_range = ranges
        .values()
        .map(|r| r.range)
        .fold(f64::NEG_INFINITY, f64::max);
    let max_range = if max_range > 0.0 { max_range } else { 1.0 };

    let mut k_values = KValues::new();
    let mut entries = Vec::with_capacity(base_importance.len());

    for (variable, importance) in base_importance {
        let importance = Some(*importance);

        let status = match ranges.get(variable.as_str()) {
            Some(observed) => {
                let normalized_range = if observed.degenerate {
                    0.0
                } else {
                    observed.range / max_range
                };
                let factor = variation_factor(normalized_range);
                CalibrationStatus::Computed {
                    range: observed.range,
                    normalized_range,
                    variation_factor: factor,
                    degenerate: observed.degenerate,
                    k_value: finite(importance).map(|i| i * factor),
                }
            }
            None => {
                tracing::warn!(crop = %crop.name, %variable, "Variable missing from weather data");
                CalibrationStatus::MissingFromData {
                    k_value: finite(importance),
                }
            }
        };

        tracing::debug!(crop = %crop.name, %variable, k = ?status.k_value(), "Computed k value");
        k_values.insert(variable.clone(), status.k_value());
        entries.push(CalibrationEntry {
            crop: crop.name.clone(),
            variable: variable.clone(),
            base_importance: importance,
            status,
        });
    }

    let mut calibrated = crop.clone();
    calibrated.k_values = Some(k_values);

    CropCalibration {
        crop: calibrated,
        entries,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shared::{DailyWeather, GpsCoordinates};

    fn crop(name: &str, days: Vec<DailyWeather>) -> Crop {
        Crop {
            name: name.to_string(),
            variety: "RD6".to_string(),
            region: "Isan".to_string(),
            coordinates: GpsCoordinates::new(Decimal::new(164, 1), Decimal::new(1028, 1)),
            planting_season_month: 7,
            duration_days: days.len().max(1),
            daily_weather: if days.is_empty() { None } else { Some(days) },
            k_values: None,
        }
    }

    fn days(values: &[(&str, &[Option<f64>])]) -> Vec<DailyWeather> {
        let len = values.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        (0..len)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2023, 7, 1 + i as u32).unwrap();
                values.iter().fold(DailyWeather::new(date), |day, (name, v)| {
                    day.with(*name, v[i])
                })
            })
            .collect()
    }

    fn importance(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_constant_series_keeps_base_importance() {
        let c = crop("rice", days(&[("t", &[Some(30.0), Some(30.0), Some(30.0)])]));
        let outcome = compute_k_values(&[c], &importance(&[("t", 0.8)])).unwrap();

        let k = outcome.crops[0].k_value("t");
        assert_eq!(k, Some(0.8));
        let entry = outcome.log.entry("rice", "t").unwrap();
        assert!(matches!(
            entry.status,
            CalibrationStatus::Computed { range, degenerate: true, .. } if range == 1.0
        ));
    }

    #[test]
    fn test_widest_variable_gets_half_its_importance() {
        let c = crop(
            "maize",
            days(&[
                ("t", &[Some(20.0), Some(30.0)]),
                ("p", &[Some(0.0), Some(5.0)]),
            ]),
        );
        let outcome =
            compute_k_values(&[c], &importance(&[("t", 1.0), ("p", 1.0)])).unwrap();
        let calibrated = &outcome.crops[0];

        assert_eq!(calibrated.k_value("t"), Some(0.5));
        assert_eq!(calibrated.k_value("p"), Some(0.75));
    }

    #[test]
    fn test_missing_variable_falls_back_to_importance() {
        let c = crop("cassava", days(&[("t", &[Some(20.0), Some(25.0)])]));
        let outcome =
            compute_k_values(&[c], &importance(&[("t", 1.0), ("wind", 0.4)])).unwrap();

        assert_eq!(outcome.crops[0].k_value("wind"), Some(0.4));
        assert_eq!(outcome.log.summary.variables_missing, 1);
        assert_eq!(outcome.log.summary.variables_computed, 1);
        assert!(matches!(
            outcome.log.entry("cassava", "wind").unwrap().status,
            CalibrationStatus::MissingFromData { .. }
        ));
    }

    #[test]
    fn test_non_finite_importance_gives_null_k() {
        let c = crop("sugarcane", days(&[("t", &[Some(20.0), Some(25.0)])]));
        let outcome = compute_k_values(&[c], &importance(&[("t", f64::NAN)])).unwrap();

        let k_values = outcome.crops[0].k_values.as_ref().unwrap();
        assert_eq!(k_values.get("t"), Some(&None));
    }

    #[test]
    fn test_all_null_series_is_degenerate() {
        let c = crop("rice", days(&[("t", &[None, None])]));
        let outcome = compute_k_values(&[c], &importance(&[("t", 0.6)])).unwrap();

        assert_eq!(outcome.crops[0].k_value("t"), Some(0.6));
    }

    #[test]
    fn test_crop_without_weather_is_skipped() {
        let skipped = crop("sorghum", Vec::new());
        let ok = crop("rice", days(&[("t", &[Some(1.0), Some(2.0)])]));
        let outcome =
            compute_k_values(&[skipped.clone(), ok], &importance(&[("t", 1.0)])).unwrap();

        assert_eq!(outcome.crops.len(), 2);
        assert_eq!(outcome.crops[0], skipped);
        assert_eq!(outcome.log.summary.crops_skipped, 1);
        assert_eq!(outcome.log.summary.crops_calibrated, 1);
        assert_eq!(outcome.log.errors.len(), 1);
        assert_eq!(outcome.log.errors[0].crop.as_deref(), Some("sorghum"));
    }

    #[test]
    fn test_calibration_replaces_existing_k_values() {
        let mut c = crop("rice", days(&[("t", &[Some(1.0), Some(1.0)])]));
        let mut stale = KValues::new();
        stale.insert("old".to_string(), Some(9.0));
        c.k_values = Some(stale);

        let outcome = compute_k_values(&[c], &importance(&[("t", 1.0)])).unwrap();
        let k_values = outcome.crops[0].k_values.as_ref().unwrap();
        assert_eq!(k_values.len(), 1);
        assert!(!k_values.contains_key("old"));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let c = crop("rice", days(&[("t", &[Some(1.0)])]));
        assert!(matches!(
            compute_k_values(&[], &importance(&[("t", 1.0)])),
            Err(EngineError::NoCrops)
        ));
        assert!(matches!(
            compute_k_values(&[c], &BTreeMap::new()),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_variation_factor_floor() {
        assert_eq!(variation_factor(0.0), 1.0);
        assert_eq!(variation_factor(1.0), 0.5);
        assert_eq!(variation_factor(5.0), MIN_VARIATION_FACTOR);
    }
}
