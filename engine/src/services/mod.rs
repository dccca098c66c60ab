//! Matching, calibration and pipeline services for the crop-window engine

pub mod calibration;
pub mod charts;
pub mod dataset;
pub mod forecast;
pub mod matching;
pub mod onboarding;
pub mod pipeline;
pub mod scoring;
pub mod weights;
pub mod windows;

pub use calibration::compute_k_values;
pub use forecast::{ForecastMatchReport, ForecastMatchingService};
pub use matching::run_matching;
pub use onboarding::{CropOnboardingService, OnboardingReport};
pub use pipeline::{PipelineStage, RenderedChart, StageFailure};
