//! Error handling for the crop-window matching engine
//!
//! `EngineError` covers batch-fatal failures and collaborator failures.
//! Failures scoped to one crop, window or variable are never raised past
//! their scope: they are captured into the run's diagnostic log instead.

use thiserror::Error;

/// Engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    // Batch-fatal input errors
    #[error("No crops supplied")]
    NoCrops,

    #[error("Forecast series is empty")]
    EmptyForecast,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    // Collaborator errors
    #[error("Weather provider error: {0}")]
    WeatherProvider(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Chart rendering error: {0}")]
    Rendering(String),

    // Ambient errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used in CLI exit reports
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NoCrops => "NO_CROPS",
            EngineError::EmptyForecast => "EMPTY_FORECAST",
            EngineError::InvalidConfig(_) => "INVALID_CONFIG",
            EngineError::Validation { .. } => "VALIDATION_ERROR",
            EngineError::WeatherProvider(_) => "WEATHER_PROVIDER_ERROR",
            EngineError::Storage(_) => "STORAGE_ERROR",
            EngineError::Rendering(_) => "RENDERING_ERROR",
            EngineError::Configuration(_) => "CONFIGURATION_ERROR",
            EngineError::Io(_) => "IO_ERROR",
            EngineError::Json(_) => "JSON_ERROR",
            EngineError::Csv(_) => "CSV_ERROR",
            EngineError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = EngineError::validation("crops[0].name", "Crop name must not be empty");
        assert_eq!(
            err.to_string(),
            "Validation error on crops[0].name: Crop name must not be empty"
        );
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_from_json_error() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: EngineError = parse.unwrap_err().into();
        assert_eq!(err.code(), "JSON_ERROR");
    }
}
