//! Forecast matching against the stored crop set

use std::sync::Arc;

use serde::Serialize;
use shared::{DailyWeather, MatchOutcome};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::external::{ChartRenderer, CropStore};
use crate::services::charts::window_time_series;
use crate::services::matching::run_matching;
use crate::services::pipeline::{PipelineStage, RenderedChart, StageFailure};

#[derive(Debug, Clone, Serialize)]
pub struct ForecastMatchReport {
    pub outcome: MatchOutcome,
    pub failures: Vec<StageFailure>,
    pub charts: Vec<RenderedChart>,
}

/// Forecast matching service
#[derive(Clone)]
pub struct ForecastMatchingService {
    store: Arc<dyn CropStore>,
    renderer: Option<Arc<dyn ChartRenderer>>,
    config: EngineConfig,
}

impl ForecastMatchingService {
    pub fn new(store: Arc<dyn CropStore>, config: EngineConfig) -> Self {
        Self {
            store,
            renderer: None,
            config,
        }
    }

    /// Render the best window of every matched crop
    pub fn with_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Match a forecast against every stored crop
    pub async fn match_forecast(
        &self,
        forecast: Vec<DailyWeather>,
    ) -> EngineResult<ForecastMatchReport> {
        let crops = self.store.load_all().await?;
        tracing::info!(
            crops = crops.len(),
            forecast_days = forecast.len(),
            "Matching forecast against stored crops"
        );

        let outcome = run_matching(&crops, &forecast, &self.config.matching)?;

        let mut failures = Vec::new();
        let mut charts = Vec::new();
        if let Some(renderer) = &self.renderer {
            for result in &outcome.results {
                let (Some(best), Some(crop)) =
                    (result.best(), crops.iter().find(|c| c.name == result.crop))
                else {
                    continue;
                };
                let chart = window_time_series(
                    crop,
                    &forecast,
                    best,
                    &self.config.matching.required_fields,
                );
                match renderer.render(&chart).await {
                    Ok(image) => charts.push(RenderedChart {
                        crop: crop.name.clone(),
                        title: chart.title().to_string(),
                        image,
                    }),
                    Err(err) => {
                        tracing::error!(crop = %crop.name, error = %err, "Failed to render window chart");
                        failures.push(StageFailure::new(&crop.name, PipelineStage::Render, err));
                    }
                }
            }
        }

        Ok(ForecastMatchReport {
            outcome,
            failures,
            charts,
        })
    }
}
