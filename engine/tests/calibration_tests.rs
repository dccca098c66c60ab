//! Calibration integration tests
//!
//! Tests for k value calibration including:
//! - Constant-series round trip to the base importance
//! - Missing variables and crops without weather
//! - Bounds of calibrated k values

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use cropmatch::{compute_k_values, run_matching, CalibrationConfig, MatchingConfig};
use shared::{variables, CalibrationStatus, Crop, DailyWeather, GpsCoordinates, WeightScheme};

fn history(columns: &[(&str, Vec<Option<f64>>)]) -> Vec<DailyWeather> {
    let start = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
    let len = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    (0..len)
        .map(|i| {
            columns.iter().fold(
                DailyWeather::new(start + Duration::days(i as i64)),
                |day, (name, values)| match values.get(i) {
                    Some(value) => day.with(*name, *value),
                    None => day,
                },
            )
        })
        .collect()
}

fn crop(name: &str, daily_weather: Option<Vec<DailyWeather>>) -> Crop {
    Crop {
        name: name.to_string(),
        variety: "Suphan Buri 1".to_string(),
        region: "Central".to_string(),
        coordinates: GpsCoordinates::new(Decimal::new(144, 1), Decimal::new(1000, 1)),
        planting_season_month: 5,
        duration_days: daily_weather.as_ref().map_or(1, |d| d.len().max(1)),
        daily_weather,
        k_values: None,
    }
}

fn constant(value: f64, days: usize) -> Vec<Option<f64>> {
    vec![Some(value); days]
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Constant series keep exactly their base importance
    #[test]
    fn test_constant_series_round_trip() {
        let importance = CalibrationConfig::default().base_importance;
        let columns: Vec<(&str, Vec<Option<f64>>)> = variables::DEFAULT_DAILY
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, constant(i as f64 * 3.0, 10)))
            .collect();
        let rice = crop("rice", Some(history(&columns)));

        let outcome = compute_k_values(&[rice], &importance).unwrap();
        let calibrated = &outcome.crops[0];

        for (variable, base) in &importance {
            assert_eq!(calibrated.k_value(variable), Some(*base), "{}", variable);
        }
        assert_eq!(outcome.log.summary.variables_computed, 6);
        assert_eq!(outcome.log.entries.len(), 6);
    }

    #[test]
    fn test_variable_spread_discounts_importance() {
        let importance: BTreeMap<String, f64> = [("t".to_string(), 1.0), ("rh".to_string(), 0.6)]
            .into_iter()
            .collect();
        let maize = crop(
            "maize",
            Some(history(&[
                ("t", vec![Some(24.0), Some(34.0), None]),
                ("rh", vec![Some(70.0), Some(70.0), Some(70.0)]),
            ])),
        );

        let outcome = compute_k_values(&[maize], &importance).unwrap();

        // t has the widest spread (10): factor 0.5
        assert_eq!(outcome.crops[0].k_value("t"), Some(0.5));
        // rh is constant: degenerate, keeps its importance
        assert_eq!(outcome.crops[0].k_value("rh"), Some(0.6));

        let Some(entry) = outcome.log.entry("maize", "t") else {
            panic!("missing log entry");
        };
        assert_eq!(
            entry.status,
            CalibrationStatus::Computed {
                range: 10.0,
                normalized_range: 1.0,
                variation_factor: 0.5,
                degenerate: false,
                k_value: Some(0.5),
            }
        );
    }

    #[test]
    fn test_crops_without_weather_pass_through() {
        let importance = CalibrationConfig::default().base_importance;
        let crops = vec![
            crop("sorghum", None),
            crop("rice", Some(history(&[(variables::TEMPERATURE_MAX, constant(30.0, 3))]))),
        ];

        let outcome = compute_k_values(&crops, &importance).unwrap();

        assert_eq!(outcome.crops[0], crops[0]);
        assert!(outcome.crops[0].k_values.is_none());
        assert_eq!(outcome.log.summary.crops_skipped, 1);
        assert_eq!(outcome.log.summary.crops_calibrated, 1);
        // Only temperature_2m_max is in the data; the other five fall back
        assert_eq!(outcome.log.summary.variables_computed, 1);
        assert_eq!(outcome.log.summary.variables_missing, 5);
    }

    /// Calibrated k values feed matching as normalized weights
    #[test]
    fn test_calibrated_crop_matches_with_normalized_weights() {
        let importance = CalibrationConfig::default().base_importance;
        let columns: Vec<(&str, Vec<Option<f64>>)> = variables::DEFAULT_DAILY
            .iter()
            .map(|name| (*name, vec![Some(20.0), Some(22.0)]))
            .collect();
        let rice = crop("rice", Some(history(&columns)));

        let calibrated = compute_k_values(&[rice], &importance).unwrap().crops;

        let forecast_start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let forecast: Vec<DailyWeather> = (0..4)
            .map(|i| {
                variables::DEFAULT_DAILY.iter().fold(
                    DailyWeather::new(forecast_start + Duration::days(i)),
                    |day, name| day.with(*name, Some(20.0 + (i % 2) as f64 * 2.0)),
                )
            })
            .collect();

        let outcome = run_matching(&calibrated, &forecast, &MatchingConfig::default()).unwrap();
        let result = outcome.result("rice").unwrap();

        assert_eq!(result.weight_scheme, WeightScheme::Normalized);
        let weight_sum: f64 = result.windows[0].variables.iter().map(|v| v.weight).sum();
        assert!((weight_sum - 1.0).abs() < 1e-9);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating a daily value series
    fn series_strategy() -> impl Strategy<Value = Vec<Option<f64>>> {
        prop::collection::vec(
            prop_oneof![
                1 => Just(None),
                5 => (-400i32..=400i32).prop_map(|n| Some(n as f64 / 10.0)),
            ],
            1..20,
        )
    }

    /// Strategy for generating a base importance
    fn importance_strategy() -> impl Strategy<Value = f64> {
        (1i32..=20i32).prop_map(|n| n as f64 / 10.0)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// k values stay between half and all of the base importance
        #[test]
        fn prop_k_within_importance_bounds(
            a in series_strategy(),
            b in series_strategy(),
            ia in importance_strategy(),
            ib in importance_strategy(),
        ) {
            let importance: BTreeMap<String, f64> =
                [("a".to_string(), ia), ("b".to_string(), ib)].into_iter().collect();
            let c = crop("rice", Some(history(&[("a", a), ("b", b)])));

            let outcome = compute_k_values(&[c], &importance).unwrap();
            for (variable, base) in &importance {
                let k = outcome.crops[0].k_value(variable).unwrap();
                prop_assert!(k <= *base + 1e-12);
                prop_assert!(k >= base * 0.5 - 1e-12);
            }
        }

        /// A constant series always calibrates to its base importance
        #[test]
        fn prop_constant_series_keeps_importance(
            value in -100i32..100i32,
            days in 1usize..30,
            base in importance_strategy(),
        ) {
            let importance: BTreeMap<String, f64> = [("t".to_string(), base)].into_iter().collect();
            let c = crop("rice", Some(history(&[("t", constant(value as f64, days))])));

            let outcome = compute_k_values(&[c], &importance).unwrap();
            prop_assert_eq!(outcome.crops[0].k_value("t"), Some(base));
        }
    }
}
