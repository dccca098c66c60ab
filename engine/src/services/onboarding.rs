//! Crop onboarding: fetch each crop's historical season, calibrate, persist

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use shared::{
    validate_crop, validate_unique_names, CalibrationOutcome, Crop, DailyWeather, DateRange,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::external::{ChartRenderer, CropStore, WeatherProvider};
use crate::services::calibration::compute_k_values;
use crate::services::charts::k_value_radar;
use crate::services::pipeline::{PipelineStage, RenderedChart, StageFailure};

/// Result of onboarding a batch of crops
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingReport {
    pub calibration: CalibrationOutcome,
    pub failures: Vec<StageFailure>,
    pub charts: Vec<RenderedChart>,
}

impl OnboardingReport {
    pub fn failures_for(&self, crop: &str) -> impl Iterator<Item = &StageFailure> {
        let crop = crop.to_string();
        self.failures.iter().filter(move |f| f.crop == crop)
    }
}

/// Historical season of a crop: the 1st of its planting month in
/// `reference_year`, spanning `duration_days`
pub fn historical_range(crop: &Crop, reference_year: i32) -> EngineResult<DateRange> {
    let start = NaiveDate::from_ymd_opt(reference_year, crop.planting_season_month, 1)
        .ok_or_else(|| {
            EngineError::validation(
                "planting_season_month",
                format!(
                    "no date for month {} of {}",
                    crop.planting_season_month, reference_year
                ),
            )
        })?;
    let days = crop.duration_days.max(1) as i64;
    Ok(DateRange::new(start, start + Duration::days(days - 1)))
}

/// Crop onboarding service
#[derive(Clone)]
pub struct CropOnboardingService {
    weather: Arc<dyn WeatherProvider>,
    store: Arc<dyn CropStore>,
    renderer: Option<Arc<dyn ChartRenderer>>,
    config: EngineConfig,
}

impl CropOnboardingService {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        store: Arc<dyn CropStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            weather,
            store,
            renderer: None,
            config,
        }
    }

    /// Render a k value radar chart for every calibrated crop
    pub fn with_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Enrich, calibrate and persist a batch of crop descriptors
    pub async fn configure(&self, crops: Vec<Crop>) -> EngineResult<OnboardingReport> {
        self.config.check()?;
        if crops.is_empty() {
            return Err(EngineError::NoCrops);
        }
        validate_unique_names(&crops).map_err(|msg| EngineError::validation("crops", msg))?;

        tracing::info!(crops = crops.len(), "Onboarding crops");

        let mut failures = Vec::new();
        let mut enriched = Vec::with_capacity(crops.len());
        for mut crop in crops {
            crop.daily_weather = None;
            match self.fetch_history(&crop).await {
                Ok(history) if !history.is_empty() => crop.daily_weather = Some(history),
                Ok(_) => {
                    tracing::warn!(crop = %crop.name, "Weather provider returned no records");
                    failures.push(StageFailure::new(
                        &crop.name,
                        PipelineStage::Fetch,
                        "weather provider returned no records",
                    ));
                }
                Err((stage, err)) => {
                    tracing::error!(crop = %crop.name, error = %err, "Failed to fetch weather");
                    failures.push(StageFailure::new(&crop.name, stage, err));
                }
            }
            enriched.push(crop);
        }

        let calibration = compute_k_values(&enriched, &self.config.calibration.base_importance)?;

        let mut charts = Vec::new();
        for crop in calibration.crops.iter().filter(|c| c.k_values.is_some()) {
            if let Err(err) = self.store.save(crop).await {
                tracing::error!(crop = %crop.name, error = %err, "Failed to persist crop");
                failures.push(StageFailure::new(&crop.name, PipelineStage::Persist, err));
            }

            let Some(renderer) = &self.renderer else {
                continue;
            };
            let Some(chart) = k_value_radar(crop) else {
                continue;
            };
            match renderer.render(&chart).await {
                Ok(image) => charts.push(RenderedChart {
                    crop: crop.name.clone(),
                    title: chart.title().to_string(),
                    image,
                }),
                Err(err) => {
                    tracing::error!(crop = %crop.name, error = %err, "Failed to render k value chart");
                    failures.push(StageFailure::new(&crop.name, PipelineStage::Render, err));
                }
            }
        }

        tracing::info!(
            calibrated = calibration.log.summary.crops_calibrated,
            failures = failures.len(),
            "Onboarding finished"
        );

        Ok(OnboardingReport {
            calibration,
            failures,
            charts,
        })
    }

    async fn fetch_history(
        &self,
        crop: &Crop,
    ) -> Result<Vec<DailyWeather>, (PipelineStage, EngineError)> {
        validate_crop(crop)
            .map_err(|msg| (PipelineStage::Validate, EngineError::validation("crop", msg)))?;
        let range = historical_range(crop, self.config.calibration.reference_year)
            .map_err(|err| (PipelineStage::Validate, err))?;

        tracing::debug!(crop = %crop.name, start = %range.start, end = %range.end, "Fetching historical weather");
        self.weather
            .fetch_daily(
                &crop.coordinates,
                &range,
                &self.config.calibration.weather_parameters,
            )
            .await
            .map_err(|err| (PipelineStage::Fetch, err))
    }
}
