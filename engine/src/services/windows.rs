//! Window enumeration and the data-completeness gate

use shared::DailyWeather;

/// Start offsets of every window that fits: `0, step, 2*step, ...`
pub fn window_starts(
    forecast_len: usize,
    window_len: usize,
    step: usize,
) -> impl Iterator<Item = usize> {
    (0..forecast_len)
        .step_by(step.max(1))
        .take_while(move |start| start + window_len <= forecast_len)
}

/// Valid-value count of a forecast window over the required fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completeness {
    pub valid: usize,
    pub total: usize,
}

impl Completeness {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64
        }
    }

    /// A window passes when `ratio >= 1 - max_nan_ratio`
    pub fn passes(&self, max_nan_ratio: f64) -> bool {
        self.ratio() >= 1.0 - max_nan_ratio
    }
}

/// Count valid values across every required field and every day of the window
pub fn completeness(window: &[DailyWeather], fields: &[String]) -> Completeness {
    let valid = window
        .iter()
        .map(|day| fields.iter().filter(|f| day.value(f).is_some()).count())
        .sum();

    Completeness {
        valid,
        total: window.len() * fields.len(),
    }
}
