//! Chart specifications handed to the rendering collaborator
//!
//! These carry labels and data only; pixels are the renderer's business.

use serde::{Deserialize, Serialize};

/// One variable's forecast and historical values, aligned with the chart labels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableSeries {
    pub variable: String,
    pub forecast: Vec<Option<f64>>,
    pub historical: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "chart", rename_all = "snake_case")]
pub enum ChartSpec {
    /// One panel per variable over the window's days
    TimeSeries {
        title: String,
        labels: Vec<String>,
        series: Vec<VariableSeries>,
    },
    /// k value per variable
    Radar {
        title: String,
        labels: Vec<String>,
        values: Vec<f64>,
    },
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            ChartSpec::TimeSeries { title, .. } | ChartSpec::Radar { title, .. } => title,
        }
    }
}
