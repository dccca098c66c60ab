//! Calibration results and the calibration audit log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::crop::Crop;
use crate::models::log::LogError;

/// How a crop's k value for one variable was obtained
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CalibrationStatus {
    /// Derived from the variable's historical range
    Computed {
        range: f64,
        normalized_range: f64,
        variation_factor: f64,
        /// Constant series or no valid value; contributes no variability
        degenerate: bool,
        k_value: Option<f64>,
    },
    /// No daily record carries the variable; k falls back to the base importance
    MissingFromData { k_value: Option<f64> },
}

impl CalibrationStatus {
    pub fn k_value(&self) -> Option<f64> {
        match self {
            CalibrationStatus::Computed { k_value, .. }
            | CalibrationStatus::MissingFromData { k_value } => *k_value,
        }
    }
}

/// One audit line: one crop, one variable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationEntry {
    pub crop: String,
    pub variable: String,
    pub base_importance: Option<f64>,
    #[serde(flatten)]
    pub status: CalibrationStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CalibrationSummary {
    pub total_crops: usize,
    pub crops_calibrated: usize,
    pub crops_skipped: usize,
    pub variables_computed: usize,
    pub variables_missing: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationLog {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: CalibrationSummary,
    pub entries: Vec<CalibrationEntry>,
    pub errors: Vec<LogError>,
}

impl CalibrationLog {
    pub fn entry(&self, crop: &str, variable: &str) -> Option<&CalibrationEntry> {
        self.entries
            .iter()
            .find(|e| e.crop == crop && e.variable == variable)
    }
}

/// Every input crop, in input order, plus the audit log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationOutcome {
    pub crops: Vec<Crop>,
    pub log: CalibrationLog,
}
