//! Diagnostic log entries shared by calibration and matching

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A captured, non-fatal error with the context it occurred in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    pub message: String,
}

impl LogError {
    pub fn crop(crop: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            crop: Some(crop.into()),
            window_start: None,
            variable: None,
            message: message.into(),
        }
    }

    pub fn at_window(mut self, start: NaiveDate) -> Self {
        self.window_start = Some(start);
        self
    }

    pub fn for_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(crop) = &self.crop {
            write!(f, "[{}", crop)?;
            if let Some(start) = &self.window_start {
                write!(f, " @ {}", start)?;
            }
            if let Some(variable) = &self.variable {
                write!(f, " / {}", variable)?;
            }
            write!(f, "] ")?;
        }
        write!(f, "{}", self.message)
    }
}
