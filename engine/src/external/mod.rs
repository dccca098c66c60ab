//! Collaborator integrations
//!
//! The engine never talks to a weather archive, a chart backend or a database
//! directly; pipelines receive implementations of these traits.

pub mod store;

pub use store::JsonFileCropStore;

use async_trait::async_trait;
use shared::{ChartSpec, Crop, DailyWeather, DateRange, GpsCoordinates};

use crate::error::EngineResult;

/// Source of daily historical weather
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Daily records for `variables` at `coordinates` over `range`, inclusive.
    ///
    /// Failures should surface as `EngineError::WeatherProvider`.
    async fn fetch_daily(
        &self,
        coordinates: &GpsCoordinates,
        range: &DateRange,
        variables: &[String],
    ) -> EngineResult<Vec<DailyWeather>>;
}

/// Turns a chart specification into an image
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, chart: &ChartSpec) -> EngineResult<Vec<u8>>;
}

/// Persistence for calibrated crops
#[async_trait]
pub trait CropStore: Send + Sync {
    /// Insert or replace a crop by name
    async fn save(&self, crop: &Crop) -> EngineResult<()>;

    async fn load_all(&self) -> EngineResult<Vec<Crop>>;
}
