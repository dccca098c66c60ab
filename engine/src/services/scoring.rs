//! Per-variable and per-window similarity scoring
//!
//! A window is scored against a crop's historical profile day by day:
//!
//! 1. `relative_delta = |forecast - historical| / (|historical| + 1e-5)`
//! 2. `logistic = 1 / (1 + exp(clamp(-k * sqrt(relative_delta), -709, 709)))`
//! 3. variable score = mean logistic over days where both sides are valid
//! 4. window score = sum(variable score * weight) / sum(weights actually used)
//!
//! An exact match (delta 0) scores 0.5 for any k; the transform has no bias term.

use shared::{DailyWeather, KSource, SkipReason, SkippedVariable, VariableDetail};
use thiserror::Error;

/// Guards the division when the historical value is exactly zero
pub const RELATIVE_DELTA_EPSILON: f64 = 1e-5;

/// `exp(709)` is the largest power that stays finite in f64
pub const EXPONENT_LIMIT: f64 = 709.0;

/// Per-variable numeric failures. Captured into the log, never propagated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("score for {variable} is not finite ({value})")]
    NonFinite { variable: String, value: f64 },

    #[error("sensitivity for {variable} is not usable ({k})")]
    InvalidSensitivity { variable: String, k: f64 },
}

impl ScoringError {
    pub fn variable(&self) -> &str {
        match self {
            ScoringError::NonFinite { variable, .. }
            | ScoringError::InvalidSensitivity { variable, .. } => variable,
        }
    }
}

pub fn relative_delta(forecast: f64, historical: f64) -> f64 {
    (forecast - historical).abs() / (historical.abs() + RELATIVE_DELTA_EPSILON)
}

pub fn logistic_score(k: f64, relative_delta: f64) -> f64 {
    let exponent = (-k * relative_delta.sqrt()).clamp(-EXPONENT_LIMIT, EXPONENT_LIMIT);
    1.0 / (1.0 + exponent.exp())
}

/// Round a score to 4 decimal places for reporting
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

/// A variable to score, with the sensitivity and weight decided for the crop
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWeight {
    pub variable: String,
    pub k: KSource,
    pub weight: f64,
}

/// Result of scoring one variable over one window
#[derive(Debug, Clone, PartialEq)]
pub enum VariableOutcome {
    Scored(VariableDetail),
    Skipped(SkipReason),
}

/// Score one variable over a forecast window and its aligned historical days.
///
/// Day `i` of the window is compared with day `i` of the history; days where
/// either side is null or not finite are dropped.
pub fn score_variable(
    forecast: &[DailyWeather],
    history: &[DailyWeather],
    field: &FieldWeight,
) -> Result<VariableOutcome, ScoringError> {
    let variable = field.variable.as_str();
    let k = field.k.value();

    if !k.is_finite() {
        return Err(ScoringError::InvalidSensitivity {
            variable: variable.to_string(),
            k,
        });
    }
    if !forecast.iter().any(|d| d.is_present(variable)) {
        return Ok(VariableOutcome::Skipped(SkipReason::MissingFromForecast));
    }
    if !history.iter().any(|d| d.is_present(variable)) {
        return Ok(VariableOutcome::Skipped(SkipReason::MissingFromHistory));
    }

    let mut forecast_nan_count = 0;
    let mut historical_nan_count = 0;
    let mut delta_sum = 0.0;
    let mut logistic_sum = 0.0;
    let mut valid_points = 0usize;

    for (f_day, h_day) in forecast.iter().zip(history.iter()) {
        let f = f_day.value(variable);
        let h = h_day.value(variable);
        if f.is_none() {
            forecast_nan_count += 1;
        }
        if h.is_none() {
            historical_nan_count += 1;
        }
        let (Some(f), Some(h)) = (f, h) else {
            continue;
        };

        let delta = relative_delta(f, h);
        delta_sum += delta;
        logistic_sum += logistic_score(k, delta);
        valid_points += 1;
    }

    if valid_points == 0 {
        return Ok(VariableOutcome::Skipped(SkipReason::NoValidPairs));
    }

    let variable_score = logistic_sum / valid_points as f64;
    if !variable_score.is_finite() {
        return Err(ScoringError::NonFinite {
            variable: variable.to_string(),
            value: variable_score,
        });
    }

    Ok(VariableOutcome::Scored(VariableDetail {
        variable: variable.to_string(),
        k: field.k,
        weight: field.weight,
        valid_points,
        forecast_nan_count,
        historical_nan_count,
        avg_relative_delta: delta_sum / valid_points as f64,
        variable_score,
        weighted_score: variable_score * field.weight,
    }))
}

/// Aggregate scoring of one window across all fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowScore {
    /// Rounded weighted score; `None` when no variable contributed
    pub score: Option<f64>,
    pub variables: Vec<VariableDetail>,
    pub skipped: Vec<SkippedVariable>,
    pub errors: Vec<ScoringError>,
}

/// Score a window; the denominator only counts weights of variables that scored
pub fn score_window(
    forecast: &[DailyWeather],
    history: &[DailyWeather],
    fields: &[FieldWeight],
) -> WindowScore {
    let mut window = WindowScore::default();
    let mut weighted_sum = 0.0;
    let mut weight_used = 0.0;

    for field in fields {
        match score_variable(forecast, history, field) {
            Ok(VariableOutcome::Scored(detail)) => {
                weighted_sum += detail.weighted_score;
                weight_used += detail.weight;
                window.variables.push(detail);
            }
            Ok(VariableOutcome::Skipped(reason)) => window.skipped.push(SkippedVariable {
                variable: field.variable.clone(),
                reason,
            }),
            Err(err) => window.errors.push(err),
        }
    }

    if !window.variables.is_empty() && weight_used > 0.0 {
        let score = weighted_sum / weight_used;
        if score.is_finite() {
            window.score = Some(round_score(score));
        }
    }

    window
}
