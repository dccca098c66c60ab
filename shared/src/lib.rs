//! Shared types and models for the crop-window matching engine
//!
//! This crate contains the data model exchanged between the calibration and
//! matching components, the collaborators that feed them, and the callers
//! that consume their results and diagnostic logs.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
