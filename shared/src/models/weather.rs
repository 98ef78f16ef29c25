//! Weather data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions at a location; never persisted beyond one assessment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    pub pressure_hpa: f64,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: f64,
    pub visibility_km: f64,
    /// Rain in the last hour (mm)
    pub precipitation_mm: f64,
    pub clouds_percent: f64,
    pub description: String,
    pub observed_at: DateTime<Utc>,
}

/// Daily rainfall totals extracted from a multi-day forecast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RainfallForecast {
    /// One total per forecast day (mm), in date order
    pub daily_totals_mm: Vec<f64>,
}

impl RainfallForecast {
    pub fn total_mm(&self) -> f64 {
        self.daily_totals_mm.iter().sum()
    }

    pub fn days(&self) -> usize {
        self.daily_totals_mm.len()
    }
}
