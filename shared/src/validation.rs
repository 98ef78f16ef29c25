//! Validation utilities for hazard assessment inputs
//!
//! Every check here fails fast: malformed input never reaches a predictor and
//! is never silently truncated, padded or clamped.

use serde::Serialize;
use thiserror::Error;

/// Malformed input rejected before assessment
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Geographic Validations
// ============================================================================

/// Validate latitude is within [-90, 90]
pub fn validate_latitude(latitude: f64) -> Result<(), ValidationError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::new(
            "latitude",
            format!("Latitude must be between -90 and 90, got {}", latitude),
        ));
    }
    Ok(())
}

/// Validate longitude is within [-180, 180]
pub fn validate_longitude(longitude: f64) -> Result<(), ValidationError> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::new(
            "longitude",
            format!("Longitude must be between -180 and 180, got {}", longitude),
        ));
    }
    Ok(())
}

// ============================================================================
// Seismic Validations
// ============================================================================

/// Validate earthquake magnitude (1.0-10.0)
pub fn validate_magnitude(magnitude: f64) -> Result<(), ValidationError> {
    if !magnitude.is_finite() || !(1.0..=10.0).contains(&magnitude) {
        return Err(ValidationError::new(
            "magnitude",
            format!("Magnitude must be between 1.0 and 10.0, got {}", magnitude),
        ));
    }
    Ok(())
}

/// Validate hypocentre depth in km (0-700)
pub fn validate_depth(depth_km: f64) -> Result<(), ValidationError> {
    if !depth_km.is_finite() || !(0.0..=700.0).contains(&depth_km) {
        return Err(ValidationError::new(
            "depth",
            format!("Depth must be between 0 and 700 km, got {}", depth_km),
        ));
    }
    Ok(())
}

// ============================================================================
// Rainfall and Alerting Validations
// ============================================================================

/// Validate a monthly rainfall series has exactly 12 non-negative totals
pub fn validate_monthly_rainfall(monthly_mm: &[f64]) -> Result<(), ValidationError> {
    if monthly_mm.len() != 12 {
        return Err(ValidationError::new(
            "monthly_rainfall",
            format!("Rainfall series must have exactly 12 monthly values, got {}", monthly_mm.len()),
        ));
    }
    if let Some((idx, value)) = monthly_mm
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(ValidationError::new(
            "monthly_rainfall",
            format!("Rainfall for month {} must be a non-negative number, got {}", idx + 1, value),
        ));
    }
    Ok(())
}

/// Validate an alert threshold is a probability
pub fn validate_alert_threshold(threshold: f64) -> Result<(), ValidationError> {
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(ValidationError::new(
            "alert_threshold",
            format!("Alert threshold must be between 0 and 1, got {}", threshold),
        ));
    }
    Ok(())
}

/// Validate a year used as a flood feature
pub fn validate_year(year: i32) -> Result<(), ValidationError> {
    if !(1900..=2200).contains(&year) {
        return Err(ValidationError::new(
            "year",
            format!("Year must be between 1900 and 2200, got {}", year),
        ));
    }
    Ok(())
}

/// Clamp a model output into [0, 1]; NaN is treated as 0
pub fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(90.01).is_err());
        assert!(validate_latitude(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(179.9).is_ok());
        assert!(validate_longitude(-181.0).is_err());
    }

    #[test]
    fn test_validate_magnitude_and_depth() {
        assert!(validate_magnitude(8.2).is_ok());
        assert!(validate_magnitude(0.5).is_err());
        assert!(validate_depth(15.0).is_ok());
        assert!(validate_depth(-1.0).is_err());
        assert!(validate_depth(701.0).is_err());
    }

    #[test]
    fn test_validate_monthly_rainfall_length() {
        assert!(validate_monthly_rainfall(&[0.0; 12]).is_ok());
        let err = validate_monthly_rainfall(&[0.0; 11]).unwrap_err();
        assert_eq!(err.field, "monthly_rainfall");
        assert!(validate_monthly_rainfall(&[0.0; 13]).is_err());
    }

    #[test]
    fn test_validate_monthly_rainfall_negative() {
        let mut series = [10.0; 12];
        series[4] = -1.0;
        let err = validate_monthly_rainfall(&series).unwrap_err();
        assert!(err.message.contains("month 5"));
    }

    #[test]
    fn test_validate_alert_threshold() {
        assert!(validate_alert_threshold(0.64).is_ok());
        assert!(validate_alert_threshold(1.2).is_err());
    }

    #[test]
    fn test_clamp_probability() {
        assert_eq!(clamp_probability(1.3), 1.0);
        assert_eq!(clamp_probability(-0.2), 0.0);
        assert_eq!(clamp_probability(f64::NAN), 0.0);
        assert_eq!(clamp_probability(0.42), 0.42);
    }
}
