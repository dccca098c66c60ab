//! Chart specifications built from crops and match results

use shared::{sorted_by_date, ChartSpec, Crop, DailyWeather, ScoreRecord, VariableSeries};

/// Radar chart of a crop's k values, `None` when it has no usable k value
pub fn k_value_radar(crop: &Crop) -> Option<ChartSpec> {
    let k_values = crop.k_values.as_ref()?;
    let (labels, values): (Vec<String>, Vec<f64>) = k_values
        .iter()
        .filter_map(|(variable, k)| k.filter(|k| k.is_finite()).map(|k| (variable.clone(), k)))
        .unzip();

    if labels.is_empty() {
        return None;
    }

    Some(ChartSpec::Radar {
        title: format!("k values: {} ({})", crop.name, crop.variety),
        labels,
        values,
    })
}

/// Forecast against history for every variable of a scored window
pub fn window_time_series(
    crop: &Crop,
    forecast: &[DailyWeather],
    record: &ScoreRecord,
    variables: &[String],
) -> ChartSpec {
    let window: Vec<DailyWeather> = sorted_by_date(forecast)
        .into_iter()
        .filter(|day| day.date >= record.start_date && day.date <= record.end_date)
        .collect();
    let history = sorted_by_date(crop.history());

    let series = variables
        .iter()
        .map(|variable| VariableSeries {
            variable: variable.clone(),
            forecast: window.iter().map(|d| d.value(variable)).collect(),
            historical: history
                .iter()
                .take(window.len())
                .map(|d| d.value(variable))
                .collect(),
        })
        .collect();

    ChartSpec::TimeSeries {
        title: format!(
            "{}: {} to {} (score {:.4})",
            crop.name, record.start_date, record.end_date, record.score
        ),
        labels: window.iter().map(|d| d.date.to_string()).collect(),
        series,
    }
}
