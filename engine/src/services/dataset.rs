//! Reading crop and forecast datasets, exporting ranked windows

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use shared::{validate_unique_dates, Crop, CropMatchResult, DailyWeather};

use crate::error::{EngineError, EngineResult};

/// Name of the date column in forecast CSV files
pub const DATE_COLUMN: &str = "date";

/// Load a JSON array of crops
pub fn load_crops(path: impl AsRef<Path>) -> EngineResult<Vec<Crop>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Load a forecast series from JSON or CSV, chosen by file extension
pub fn load_forecast(path: impl AsRef<Path>) -> EngineResult<Vec<DailyWeather>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));

    let reader = BufReader::new(File::open(path)?);
    let forecast = if is_csv {
        parse_forecast_csv(reader)?
    } else {
        serde_json::from_reader(reader)?
    };

    validate_unique_dates(&forecast).map_err(|msg| EngineError::validation("forecast", msg))?;
    tracing::debug!(path = %path.display(), days = forecast.len(), "Loaded forecast");
    Ok(forecast)
}

/// Parse a forecast table: a `date` column plus one column per variable.
///
/// Empty cells are missing values; anything else must parse as a number.
pub fn parse_forecast_csv<R: Read>(reader: R) -> EngineResult<Vec<DailyWeather>> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers()?.clone();

    let date_idx = headers
        .iter()
        .position(|h| h.trim() == DATE_COLUMN)
        .ok_or_else(|| EngineError::validation(DATE_COLUMN, "missing date column"))?;

    let mut records = Vec::new();
    for (row, record) in csv.records().enumerate() {
        let record = record?;
        let raw_date = record.get(date_idx).unwrap_or_default().trim();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
            EngineError::validation(DATE_COLUMN, format!("row {}: {} ({})", row + 1, raw_date, e))
        })?;

        let mut day = DailyWeather::new(date);
        for (idx, header) in headers.iter().enumerate() {
            if idx == date_idx {
                continue;
            }
            let cell = record.get(idx).unwrap_or_default().trim();
            let value = if cell.is_empty() {
                None
            } else {
                Some(cell.parse::<f64>().map_err(|_| {
                    EngineError::validation(
                        header.trim(),
                        format!("row {}: not a number: {}", row + 1, cell),
                    )
                })?)
            };
            day = day.with(header.trim(), value);
        }
        records.push(day);
    }

    Ok(records)
}

#[derive(Debug, Serialize)]
struct RankedWindowRow<'a> {
    crop: &'a str,
    rank: usize,
    start_date: NaiveDate,
    end_date: NaiveDate,
    score: f64,
}

/// Export every ranked window of every crop as CSV
pub fn ranked_windows_csv(results: &[CropMatchResult]) -> EngineResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for result in results {
        for (idx, window) in result.windows.iter().enumerate() {
            wtr.serialize(RankedWindowRow {
                crop: &result.crop,
                rank: idx + 1,
                start_date: window.start_date,
                end_date: window.end_date,
                score: window.score,
            })?;
        }
    }
    let bytes = wtr.into_inner().map_err(|e| EngineError::Io(e.into_error()))?;
    let csv_data = String::from_utf8(bytes).map_err(anyhow::Error::from)?;
    Ok(csv_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ScoreRecord, WeightScheme};

    #[test]
    fn test_parse_forecast_csv() {
        let data = "date,temperature_2m_max,precipitation_sum\n\
                    2024-06-01,31.5,\n\
                    2024-06-02,30.0,4.2\n";
        let forecast = parse_forecast_csv(data.as_bytes()).unwrap();

        assert_eq!(forecast.len(), 2);
        assert_eq!(forecast[0].value("temperature_2m_max"), Some(31.5));
        assert!(forecast[0].is_present("precipitation_sum"));
        assert_eq!(forecast[0].value("precipitation_sum"), None);
        assert_eq!(forecast[1].value("precipitation_sum"), Some(4.2));
    }

    #[test]
    fn test_parse_forecast_csv_rejects_bad_cells() {
        let missing_date = "day,t\n2024-06-01,1\n";
        assert!(matches!(
            parse_forecast_csv(missing_date.as_bytes()),
            Err(EngineError::Validation { .. })
        ));

        let bad_number = "date,t\n2024-06-01,hot\n";
        let Err(EngineError::Validation { field, .. }) = parse_forecast_csv(bad_number.as_bytes())
        else {
            panic!("expected a validation error");
        };
        assert_eq!(field, "t");
    }

    #[test]
    fn test_ranked_windows_csv() {
        let date = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
        let results = vec![CropMatchResult {
            crop: "rice".to_string(),
            variety: "RD6".to_string(),
            region: "Isan".to_string(),
            window_length: 2,
            weight_scheme: WeightScheme::Uniform,
            windows: vec![
                ScoreRecord {
                    start_date: date(2),
                    end_date: date(3),
                    score: 0.7016,
                    variables: Vec::new(),
                },
                ScoreRecord {
                    start_date: date(1),
                    end_date: date(2),
                    score: 0.5,
                    variables: Vec::new(),
                },
            ],
        }];

        let csv = ranked_windows_csv(&results).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "crop,rank,start_date,end_date,score");
        assert_eq!(lines[1], "rice,1,2024-06-02,2024-06-03,0.7016");
        assert_eq!(lines[2], "rice,2,2024-06-01,2024-06-02,0.5");
    }
}
