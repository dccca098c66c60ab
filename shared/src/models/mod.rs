//! Domain models for the crop-window matching engine

mod calibration;
mod chart;
mod crop;
mod log;
mod matching;
mod weather;

pub use calibration::*;
pub use chart::*;
pub use crop::*;
pub use log::*;
pub use matching::*;
pub use weather::*;
