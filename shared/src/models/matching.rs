//! Matching results and the matching diagnostic log

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::log::LogError;

/// Where the sensitivity used for a variable came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", content = "k", rename_all = "snake_case")]
pub enum KSource {
    /// The crop's calibrated k value
    Explicit(f64),
    /// The configured default, the crop had no usable k value
    Defaulted(f64),
}

impl KSource {
    pub fn value(self) -> f64 {
        match self {
            KSource::Explicit(k) | KSource::Defaulted(k) => k,
        }
    }

    pub fn is_explicit(self) -> bool {
        matches!(self, KSource::Explicit(_))
    }
}

/// How a crop's variable weights were derived
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightScheme {
    /// k values normalized to sum to one over the fields that have one
    Normalized,
    /// `1 / len(required_fields)` for every field
    Uniform,
}

/// Per-variable scoring detail for one window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableDetail {
    pub variable: String,
    pub k: KSource,
    pub weight: f64,
    pub valid_points: usize,
    pub forecast_nan_count: usize,
    pub historical_nan_count: usize,
    pub avg_relative_delta: f64,
    pub variable_score: f64,
    pub weighted_score: f64,
}

/// Why a variable did not contribute to a window score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingFromForecast,
    MissingFromHistory,
    NoValidPairs,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingFromForecast => write!(f, "variable absent from forecast"),
            SkipReason::MissingFromHistory => write!(f, "variable absent from historical data"),
            SkipReason::NoValidPairs => write!(f, "no valid forecast/historical pairs"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedVariable {
    pub variable: String,
    pub reason: SkipReason,
}

/// A scored window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Weighted score in [0, 1], rounded to 4 decimal places
    pub score: f64,
    pub variables: Vec<VariableDetail>,
}

/// Ranked windows for a crop that produced at least one score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropMatchResult {
    pub crop: String,
    pub variety: String,
    pub region: String,
    pub window_length: usize,
    pub weight_scheme: WeightScheme,
    /// Best first; equal scores keep chronological order
    pub windows: Vec<ScoreRecord>,
}

impl CropMatchResult {
    pub fn best(&self) -> Option<&ScoreRecord> {
        self.windows.first()
    }
}

/// Terminal outcome of a crop in a matching run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CropOutcome {
    Matched { windows_scored: usize },
    DisqualifiedDuration { window_length: usize, forecast_length: usize },
    NoValidWindows,
    Failed { reason: String },
}

/// Decision taken for one window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WindowStatus {
    Scored { score: f64 },
    InsufficientData { required_ratio: f64 },
    NoScore,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowDiagnostics {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub valid_ratio: f64,
    pub status: WindowStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDetail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedVariable>,
}

/// Everything the run learned about one crop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropDiagnostics {
    pub crop: String,
    pub outcome: CropOutcome,
    pub window_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_scheme: Option<WeightScheme>,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub k_sources: BTreeMap<String, KSource>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub windows: Vec<WindowDiagnostics>,
}

impl CropDiagnostics {
    pub fn new(crop: impl Into<String>, window_length: usize, outcome: CropOutcome) -> Self {
        Self {
            crop: crop.into(),
            outcome,
            window_length,
            weight_scheme: None,
            weights: BTreeMap::new(),
            k_sources: BTreeMap::new(),
            warnings: Vec::new(),
            windows: Vec::new(),
        }
    }
}

/// Cross-crop leaderboard entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopWindow {
    pub crop: String,
    pub start_date: NaiveDate,
    pub score: f64,
}

/// Run-level counters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchSummary {
    pub total_crops: usize,
    pub crops_with_results: usize,
    pub disqualified_duration: usize,
    pub no_valid_windows: usize,
    pub crop_errors: usize,
    pub windows_evaluated: usize,
    pub windows_scored: usize,
    pub windows_insufficient_data: usize,
    pub windows_without_score: usize,
    pub top_windows: Vec<TopWindow>,
}

/// Structured log of a matching run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchLog {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub forecast_start: Option<NaiveDate>,
    pub forecast_end: Option<NaiveDate>,
    pub summary: MatchSummary,
    pub crops: Vec<CropDiagnostics>,
    pub errors: Vec<LogError>,
}

impl MatchLog {
    pub fn crop(&self, name: &str) -> Option<&CropDiagnostics> {
        self.crops.iter().find(|c| c.crop == name)
    }
}

/// Results plus the log explaining every exclusion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchOutcome {
    pub results: Vec<CropMatchResult>,
    pub log: MatchLog,
}

impl MatchOutcome {
    pub fn result(&self, crop: &str) -> Option<&CropMatchResult> {
        self.results.iter().find(|r| r.crop == crop)
    }
}
