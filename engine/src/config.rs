//! Configuration management for the crop-window matching engine
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CROPMATCH prefix
//!
//! Callers can layer a JSON override document on top of any configuration:
//! nested maps are deep-merged, scalars and lists are replaced.

use std::collections::{BTreeMap, HashSet};

use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use shared::{validate_ratio, validate_sensitivity, variables};
use validator::Validate;

use crate::error::{EngineError, EngineResult};

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Window matching settings
    pub matching: MatchingConfig,

    /// k value calibration settings
    pub calibration: CalibrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    /// Day stride between successive window starts
    #[validate(range(min = 1))]
    pub step_size: u32,

    /// Maximum fraction of missing values tolerated in a window
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_nan_ratio: f64,

    /// Sensitivity used when a crop has no k value for a variable
    pub default_k: f64,

    /// Variables considered, in reporting order
    #[validate(length(min = 1))]
    pub required_fields: Vec<String>,

    /// Size of the cross-crop leaderboard in the run summary
    #[validate(range(min = 1))]
    pub top_n: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Prior agronomic weighting per variable
    pub base_importance: BTreeMap<String, f64>,

    /// Variables requested from the weather provider during onboarding
    #[validate(length(min = 1))]
    pub weather_parameters: Vec<String>,

    /// Year whose season is fetched as a crop's historical profile
    #[validate(range(min = 1940, max = 2100))]
    pub reference_year: i32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            step_size: 1,
            max_nan_ratio: 0.2,
            default_k: 1.0,
            required_fields: variables::DEFAULT_DAILY
                .iter()
                .map(|v| v.to_string())
                .collect(),
            top_n: 5,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        let base_importance = [
            (variables::TEMPERATURE_MAX, 1.0),
            (variables::TEMPERATURE_MIN, 1.0),
            (variables::PRECIPITATION_SUM, 0.8),
            (variables::RELATIVE_HUMIDITY_MEAN, 0.6),
            (variables::WIND_SPEED_MAX, 0.4),
            (variables::SHORTWAVE_RADIATION_SUM, 0.7),
        ]
        .into_iter()
        .map(|(name, importance)| (name.to_string(), importance))
        .collect();

        Self {
            base_importance,
            weather_parameters: variables::DEFAULT_DAILY
                .iter()
                .map(|v| v.to_string())
                .collect(),
            reference_year: 2023,
        }
    }
}

impl EngineConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> EngineResult<Self> {
        let environment =
            std::env::var("CROPMATCH_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .add_source(config::Config::try_from(&EngineConfig::default())?)
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CROPMATCH__ prefix)
            .add_source(
                Environment::with_prefix("CROPMATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: EngineConfig = config.try_deserialize()?;
        loaded.check()?;
        Ok(loaded)
    }

    /// Merge a caller-supplied JSON override document over this configuration
    pub fn with_overrides(&self, overrides_json: &str) -> EngineResult<Self> {
        let merged = config::Config::builder()
            .add_source(config::Config::try_from(self)?)
            .add_source(File::from_str(overrides_json, FileFormat::Json))
            .build()?;

        let merged: EngineConfig = merged.try_deserialize()?;
        merged.check()?;
        Ok(merged)
    }

    /// Validate every section; failures are batch-fatal
    pub fn check(&self) -> EngineResult<()> {
        self.matching.check()?;
        self.calibration.check()?;
        Ok(())
    }
}

impl MatchingConfig {
    pub fn check(&self) -> EngineResult<()> {
        self.validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;

        validate_sensitivity(self.default_k)
            .map_err(|msg| EngineError::InvalidConfig(format!("default_k: {}", msg)))?;
        validate_ratio(self.max_nan_ratio)
            .map_err(|msg| EngineError::InvalidConfig(format!("max_nan_ratio: {}", msg)))?;

        let mut seen = HashSet::new();
        for field in &self.required_fields {
            if field.trim().is_empty() {
                return Err(EngineError::InvalidConfig(
                    "required_fields: field names must not be empty".to_string(),
                ));
            }
            if !seen.insert(field.as_str()) {
                return Err(EngineError::InvalidConfig(format!(
                    "required_fields: duplicate field {}",
                    field
                )));
            }
        }
        Ok(())
    }

    pub fn step(&self) -> usize {
        self.step_size as usize
    }
}

impl CalibrationConfig {
    pub fn check(&self) -> EngineResult<()> {
        self.validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;

        if self.base_importance.is_empty() {
            return Err(EngineError::InvalidConfig(
                "base_importance must name at least one variable".to_string(),
            ));
        }
        Ok(())
    }
}
