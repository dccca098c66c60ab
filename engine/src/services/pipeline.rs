//! Types shared by the collaborator pipelines

use serde::Serialize;

/// Collaborator step a per-crop failure happened in
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validate,
    Fetch,
    Persist,
    Render,
}

/// A recoverable per-crop failure of a pipeline step
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StageFailure {
    pub crop: String,
    pub stage: PipelineStage,
    pub message: String,
}

impl StageFailure {
    pub fn new(crop: impl Into<String>, stage: PipelineStage, message: impl ToString) -> Self {
        Self {
            crop: crop.into(),
            stage,
            message: message.to_string(),
        }
    }
}

/// Image bytes produced by the chart renderer
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderedChart {
    pub crop: String,
    pub title: String,
    #[serde(skip)]
    pub image: Vec<u8>,
}
