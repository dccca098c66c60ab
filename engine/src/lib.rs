//! Crop-window matching engine
//!
//! Calibrates per-variable sensitivities from each crop's historical growing
//! season, then slides every crop's profile across a weather forecast and
//! ranks candidate planting windows by similarity.

pub mod config;
pub mod error;
pub mod external;
pub mod services;

pub use config::{CalibrationConfig, EngineConfig, MatchingConfig};
pub use error::{EngineError, EngineResult};
pub use services::{compute_k_values, run_matching};
