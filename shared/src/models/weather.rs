//! Daily weather records and series

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of weather values keyed by variable name.
///
/// A variable can be absent (no key), missing (key with a null or non-finite
/// value) or valid. Serialized flat: `{"date": "2024-05-01", "precipitation_sum": 3.2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

/// Presence state of a single variable on a single day
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// The record does not carry the variable at all
    Absent,
    /// The variable is carried but null, NaN or infinite
    Missing,
    Valid(f64),
}

impl Observation {
    pub fn valid(self) -> Option<f64> {
        match self {
            Observation::Valid(v) => Some(v),
            _ => None,
        }
    }
}

impl DailyWeather {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter, mostly used when assembling records by hand
    pub fn with(mut self, variable: impl Into<String>, value: Option<f64>) -> Self {
        self.values.insert(variable.into(), value);
        self
    }

    pub fn observe(&self, variable: &str) -> Observation {
        match self.values.get(variable) {
            None => Observation::Absent,
            Some(Some(v)) if v.is_finite() => Observation::Valid(*v),
            Some(_) => Observation::Missing,
        }
    }

    /// Valid value of a variable, if any
    pub fn value(&self, variable: &str) -> Option<f64> {
        self.observe(variable).valid()
    }

    pub fn is_present(&self, variable: &str) -> bool {
        self.values.contains_key(variable)
    }

    pub fn present_variables(&self) -> BTreeSet<&str> {
        self.values.keys().map(String::as_str).collect()
    }
}

/// Return a copy of `records` sorted ascending by date.
///
/// The sort is stable, so records sharing a date keep their input order.
pub fn sorted_by_date(records: &[DailyWeather]) -> Vec<DailyWeather> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.date);
    sorted
}

/// True when at least one record carries the variable
pub fn series_has_variable(records: &[DailyWeather], variable: &str) -> bool {
    records.iter().any(|r| r.is_present(variable))
}

/// Valid values of a variable across a series, in record order
pub fn valid_values(records: &[DailyWeather], variable: &str) -> Vec<f64> {
    records.iter().filter_map(|r| r.value(variable)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_observation_states() {
        let record = DailyWeather::new(day(1))
            .with("temperature_2m_max", Some(31.5))
            .with("precipitation_sum", None)
            .with("wind_speed_10m_max", Some(f64::NAN))
            .with("et0_fao_evapotranspiration", Some(f64::INFINITY));

        assert_eq!(record.observe("temperature_2m_max"), Observation::Valid(31.5));
        assert_eq!(record.observe("precipitation_sum"), Observation::Missing);
        assert_eq!(record.observe("wind_speed_10m_max"), Observation::Missing);
        assert_eq!(record.value("et0_fao_evapotranspiration"), None);
        assert_eq!(record.observe("shortwave_radiation_sum"), Observation::Absent);
        assert!(record.is_present("precipitation_sum"));
        assert!(!record.is_present("shortwave_radiation_sum"));
    }

    #[test]
    fn test_flat_json_shape() {
        let json = r#"{"date":"2024-05-02","temperature_2m_max":30.0,"precipitation_sum":null}"#;
        let record: DailyWeather = serde_json::from_str(json).unwrap();

        assert_eq!(record.date, day(2));
        assert_eq!(record.value("temperature_2m_max"), Some(30.0));
        assert_eq!(record.observe("precipitation_sum"), Observation::Missing);
        assert_eq!(record.present_variables().len(), 2);
    }

    #[test]
    fn test_sorted_by_date_is_stable() {
        let records = vec![
            DailyWeather::new(day(3)).with("x", Some(3.0)),
            DailyWeather::new(day(1)).with("x", Some(1.0)),
            DailyWeather::new(day(3)).with("x", Some(4.0)),
        ];
        let sorted = sorted_by_date(&records);

        assert_eq!(sorted[0].date, day(1));
        assert_eq!(sorted[1].value("x"), Some(3.0));
        assert_eq!(sorted[2].value("x"), Some(4.0));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            /// Sorting keeps every record and orders dates ascending
            #[test]
            fn prop_sorted_by_date_orders_all_records(offsets in prop::collection::vec(0u32..28, 0..40)) {
                let records: Vec<DailyWeather> = offsets
                    .iter()
                    .map(|d| DailyWeather::new(day(d + 1)).with("x", Some(*d as f64)))
                    .collect();
                let sorted = sorted_by_date(&records);

                prop_assert_eq!(sorted.len(), records.len());
                for pair in sorted.windows(2) {
                    prop_assert!(pair[0].date <= pair[1].date);
                }
            }
        }
    }
}
