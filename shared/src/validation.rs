//! Validation utilities for crops, weather series and engine settings

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::models::{Crop, DailyWeather};

// ============================================================================
// Crop Validations
// ============================================================================

/// Validate crop name is usable as a batch key
pub fn validate_crop_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Crop name must not be empty");
    }
    Ok(())
}

/// Validate planting month (1-12)
pub fn validate_planting_month(month: u32) -> Result<(), &'static str> {
    if !(1..=12).contains(&month) {
        return Err("Planting season month must be between 1 and 12");
    }
    Ok(())
}

/// Validate the growing window length
pub fn validate_duration_days(days: usize) -> Result<(), &'static str> {
    if days == 0 {
        return Err("Crop duration must be at least one day");
    }
    Ok(())
}

/// Validate latitude/longitude are on the globe
pub fn validate_coordinates(latitude: Decimal, longitude: Decimal) -> Result<(), &'static str> {
    if latitude < Decimal::from(-90) || latitude > Decimal::from(90) {
        return Err("Latitude must be between -90 and 90");
    }
    if longitude < Decimal::from(-180) || longitude > Decimal::from(180) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

/// Validate every descriptive field of a crop
pub fn validate_crop(crop: &Crop) -> Result<(), &'static str> {
    validate_crop_name(&crop.name)?;
    validate_planting_month(crop.planting_season_month)?;
    validate_duration_days(crop.duration_days)?;
    validate_coordinates(crop.coordinates.latitude, crop.coordinates.longitude)?;
    Ok(())
}

/// Validate crop names are unique within a batch, returning the first duplicate
pub fn validate_unique_names(crops: &[Crop]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for crop in crops {
        if !seen.insert(crop.name.as_str()) {
            return Err(format!("Duplicate crop name in batch: {}", crop.name));
        }
    }
    Ok(())
}

// ============================================================================
// Weather Validations
// ============================================================================

/// Validate a series carries no repeated dates
pub fn validate_unique_dates(records: &[DailyWeather]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.date) {
            return Err(format!("Duplicate weather record for {}", record.date));
        }
    }
    Ok(())
}

// ============================================================================
// Engine Setting Validations
// ============================================================================

/// Validate a sensitivity coefficient is usable for scoring
pub fn validate_sensitivity(k: f64) -> Result<(), &'static str> {
    if !k.is_finite() {
        return Err("Sensitivity must be a finite number");
    }
    if k < 0.0 {
        return Err("Sensitivity cannot be negative");
    }
    Ok(())
}

/// Validate a fraction lies in [0, 1]
pub fn validate_ratio(ratio: f64) -> Result<(), &'static str> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err("Ratio must be between 0 and 1");
    }
    Ok(())
}
