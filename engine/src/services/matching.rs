//! Forecast matching: slide each crop's window across the forecast and rank it
//!
//! Per crop, outcomes are decided in this order:
//! 1. disqualified when its window is longer than the forecast
//! 2. weights derived from its k values (or uniform)
//! 3. windows enumerated at `step_size` strides
//! 4. windows below the completeness threshold are rejected unscored
//! 5. remaining windows scored; those without a score are dropped
//! 6. scored windows ranked best first, ties in chronological order
//!
//! Crops are independent of each other; each one produces a `CropRun` that is
//! folded into the run's results and log in input order.

use chrono::Utc;
use shared::{
    sorted_by_date, validate_crop_name, validate_unique_dates, validate_unique_names, Crop,
    CropDiagnostics, CropMatchResult, CropOutcome, DailyWeather, LogError, MatchLog,
    MatchOutcome, MatchSummary, ScoreRecord, TopWindow, WindowDiagnostics, WindowStatus,
};
use thiserror::Error;

use crate::config::MatchingConfig;
use crate::error::{EngineError, EngineResult};
use crate::services::scoring::score_window;
use crate::services::weights::derive_weights;
use crate::services::windows::{completeness, window_starts};

/// Per-crop failures. Captured into the log, never propagated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CropError {
    #[error("no daily weather data")]
    MissingWeather,

    #[error("invalid crop: {0}")]
    Invalid(&'static str),
}

/// Window counters for one crop
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct WindowTally {
    evaluated: usize,
    scored: usize,
    insufficient: usize,
    without_score: usize,
}

/// Everything one crop contributes to a run
#[derive(Debug, Clone)]
struct CropRun {
    diagnostics: CropDiagnostics,
    result: Option<CropMatchResult>,
    errors: Vec<LogError>,
    tally: WindowTally,
}

/// Match every crop against a forecast series.
///
/// Rejects the batch when it is empty, when crop names or forecast dates repeat,
/// or when the configuration is invalid. Everything else lands in the returned
/// log.
pub fn run_matching(
    crops: &[Crop],
    forecast: &[DailyWeather],
    config: &MatchingConfig,
) -> EngineResult<MatchOutcome> {
    config.check()?;
    if crops.is_empty() {
        return Err(EngineError::NoCrops);
    }
    if forecast.is_empty() {
        return Err(EngineError::EmptyForecast);
    }
    validate_unique_names(crops).map_err(|msg| EngineError::validation("crops", msg))?;
    validate_unique_dates(forecast).map_err(|msg| EngineError::validation("forecast", msg))?;

    let started_at = Utc::now();
    let forecast = sorted_by_date(forecast);

    tracing::info!(
        crops = crops.len(),
        forecast_days = forecast.len(),
        step_size = config.step_size,
        "Starting crop matching"
    );

    let runs: Vec<CropRun> = crops
        .iter()
        .map(|crop| match_crop(crop, &forecast, config))
        .collect();

    let outcome = assemble(runs, &forecast, config, started_at);

    tracing::info!(
        crops_with_results = outcome.log.summary.crops_with_results,
        disqualified_duration = outcome.log.summary.disqualified_duration,
        no_valid_windows = outcome.log.summary.no_valid_windows,
        windows_scored = outcome.log.summary.windows_scored,
        errors = outcome.log.errors.len(),
        "Crop matching finished"
    );

    Ok(outcome)
}

/// Fold per-crop runs into results, counters and the leaderboard
fn assemble(
    runs: Vec<CropRun>,
    forecast: &[DailyWeather],
    config: &MatchingConfig,
    started_at: chrono::DateTime<Utc>,
) -> MatchOutcome {
    let mut summary = MatchSummary {
        total_crops: runs.len(),
        ..MatchSummary::default()
    };
    let mut results = Vec::new();
    let mut crops = Vec::with_capacity(runs.len());
    let mut errors = Vec::new();

    for run in runs {
        match run.diagnostics.outcome {
            CropOutcome::Matched { .. } => summary.crops_with_results += 1,
            CropOutcome::DisqualifiedDuration { .. } => summary.disqualified_duration += 1,
            CropOutcome::NoValidWindows => summary.no_valid_windows += 1,
            CropOutcome::Failed { .. } => summary.crop_errors += 1,
        }
        summary.windows_evaluated += run.tally.evaluated;
        summary.windows_scored += run.tally.scored;
        summary.windows_insufficient_data += run.tally.insufficient;
        summary.windows_without_score += run.tally.without_score;

        if let Some(result) = run.result {
            results.push(result);
        }
        crops.push(run.diagnostics);
        errors.extend(run.errors);
    }

    summary.top_windows = top_windows(&results, config.top_n as usize);

    MatchOutcome {
        results,
        log: MatchLog {
            started_at,
            finished_at: Utc::now(),
            forecast_start: forecast.first().map(|d| d.date),
            forecast_end: forecast.last().map(|d| d.date),
            summary,
            crops,
            errors,
        },
    }
}

/// Best windows across all crops; equal scores keep crop then chronological order
fn top_windows(results: &[CropMatchResult], n: usize) -> Vec<TopWindow> {
    let mut all: Vec<TopWindow> = results
        .iter()
        .flat_map(|r| {
            r.windows.iter().map(move |w| TopWindow {
                crop: r.crop.clone(),
                start_date: w.start_date,
                score: w.score,
            })
        })
        .collect();
    all.sort_by(|a, b| b.score.total_cmp(&a.score));
    all.truncate(n);
    all
}

fn match_crop(crop: &Crop, forecast: &[DailyWeather], config: &MatchingConfig) -> CropRun {
    match try_match_crop(crop, forecast, config) {
        Ok(run) => run,
        Err(err) => {
            tracing::error!(crop = %crop.name, error = %err, "Crop matching failed");
            CropRun {
                diagnostics: CropDiagnostics::new(
                    &crop.name,
                    crop.window_length(),
                    CropOutcome::Failed {
                        reason: err.to_string(),
                    },
                ),
                result: None,
                errors: vec![LogError::crop(&crop.name, err.to_string())],
                tally: WindowTally::default(),
            }
        }
    }
}

fn try_match_crop(
    crop: &Crop,
    forecast: &[DailyWeather],
    config: &MatchingConfig,
) -> Result<CropRun, CropError> {
    validate_crop_name(&crop.name).map_err(CropError::Invalid)?;
    if !crop.has_weather() {
        return Err(CropError::MissingWeather);
    }

    let history = sorted_by_date(crop.history());
    let window_len = history.len();
    let mut diagnostics = CropDiagnostics::new(
        &crop.name,
        window_len,
        CropOutcome::NoValidWindows,
    );

    if window_len != crop.duration_days {
        diagnostics.warnings.push(format!(
            "Historical profile has {} days but duration_days is {}",
            window_len, crop.duration_days
        ));
    }

    if window_len > forecast.len() || crop.duration_days > forecast.len() {
        tracing::warn!(
            crop = %crop.name,
            window_length = window_len,
            forecast_length = forecast.len(),
            "Crop duration exceeds forecast length"
        );
        diagnostics.outcome = CropOutcome::DisqualifiedDuration {
            window_length: window_len.max(crop.duration_days),
            forecast_length: forecast.len(),
        };
        return Ok(CropRun {
            diagnostics,
            result: None,
            errors: Vec::new(),
            tally: WindowTally::default(),
        });
    }

    let plan = derive_weights(crop, config);
    diagnostics.weight_scheme = Some(plan.scheme);
    diagnostics.warnings.extend(plan.warnings.iter().cloned());
    for field in &plan.fields {
        diagnostics.weights.insert(field.variable.clone(), field.weight);
        diagnostics.k_sources.insert(field.variable.clone(), field.k);
    }

    let mut tally = WindowTally::default();
    let mut errors = Vec::new();
    let mut records = Vec::new();
    let required_ratio = 1.0 - config.max_nan_ratio;

    for start in window_starts(forecast.len(), window_len, config.step()) {
        let window = &forecast[start..start + window_len];
        let start_date = window[0].date;
        let end_date = window[window_len - 1].date;
        tally.evaluated += 1;

        let c = completeness(window, &config.required_fields);
        if !c.passes(config.max_nan_ratio) {
            tracing::debug!(
                crop = %crop.name,
                %start_date,
                valid_ratio = c.ratio(),
                "Window rejected: insufficient data"
            );
            tally.insufficient += 1;
            diagnostics.windows.push(WindowDiagnostics {
                start_date,
                end_date,
                valid_ratio: c.ratio(),
                status: WindowStatus::InsufficientData { required_ratio },
                variables: Vec::new(),
                skipped: Vec::new(),
            });
            continue;
        }

        let scored = score_window(window, &history, &plan.fields);
        for skipped in &scored.skipped {
            diagnostics.warnings.push(format!(
                "Window {}: {} skipped, {}",
                start_date, skipped.variable, skipped.reason
            ));
        }
        for err in &scored.errors {
            tracing::error!(crop = %crop.name, %start_date, error = %err, "Variable scoring failed");
            errors.push(
                LogError::crop(&crop.name, err.to_string())
                    .at_window(start_date)
                    .for_variable(err.variable()),
            );
        }

        let status = match scored.score {
            Some(score) => {
                tally.scored += 1;
                records.push(ScoreRecord {
                    start_date,
                    end_date,
                    score,
                    variables: scored.variables.clone(),
                });
                WindowStatus::Scored { score }
            }
            None => {
                tracing::debug!(crop = %crop.name, %start_date, "No valid score produced");
                tally.without_score += 1;
                diagnostics
                    .warnings
                    .push(format!("Window {}: no valid score produced", start_date));
                WindowStatus::NoScore
            }
        };

        diagnostics.windows.push(WindowDiagnostics {
            start_date,
            end_date,
            valid_ratio: c.ratio(),
            status,
            variables: scored.variables,
            skipped: scored.skipped,
        });
    }

    if records.is_empty() {
        tracing::warn!(crop = %crop.name, windows = tally.evaluated, "No valid windows");
        return Ok(CropRun {
            diagnostics,
            result: None,
            errors,
            tally,
        });
    }

    // Stable sort: equal scores keep chronological order
    records.sort_by(|a, b| b.score.total_cmp(&a.score));
    diagnostics.outcome = CropOutcome::Matched {
        windows_scored: records.len(),
    };

    Ok(CropRun {
        result: Some(CropMatchResult {
            crop: crop.name.clone(),
            variety: crop.variety.clone(),
            region: crop.region.clone(),
            window_length: window_len,
            weight_scheme: plan.scheme,
            windows: records,
        }),
        diagnostics,
        errors,
        tally,
    })
}
