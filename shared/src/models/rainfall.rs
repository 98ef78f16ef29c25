//! Monthly rainfall series and seasonal analytics for flood assessment

use serde::{Deserialize, Serialize};

use crate::geo::ClimateBand;
use crate::models::RainfallForecast;
use crate::validation::{validate_monthly_rainfall, ValidationError};

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const TROPICAL_BASELINE: [f64; 12] = [
    180.0, 160.0, 200.0, 220.0, 250.0, 280.0, 300.0, 290.0, 270.0, 240.0, 200.0, 190.0,
];
const SUBTROPICAL_BASELINE: [f64; 12] = [
    80.0, 70.0, 90.0, 110.0, 130.0, 120.0, 100.0, 90.0, 85.0, 95.0, 85.0, 80.0,
];
const TEMPERATE_BASELINE: [f64; 12] = [
    50.0, 45.0, 60.0, 70.0, 80.0, 85.0, 90.0, 85.0, 75.0, 65.0, 55.0, 50.0,
];

/// Multiplier applied to the baseline away from the prime meridian band
pub const OCEANIC_FACTOR: f64 = 1.2;
pub const CONTINENTAL_FACTOR: f64 = 0.8;
/// |longitude| above which the oceanic factor applies
pub const OCEANIC_LONGITUDE_THRESHOLD: f64 = 20.0;
/// Scales a 5-day forecast total to a 30-day estimate
pub const FORECAST_EXTRAPOLATION_FACTOR: f64 = 6.0;

/// Twelve monthly rainfall totals in mm, January first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct RainfallSeries {
    monthly_mm: [f64; 12],
}

impl RainfallSeries {
    /// Build a series from exactly twelve non-negative totals
    pub fn from_slice(monthly_mm: &[f64]) -> Result<Self, ValidationError> {
        validate_monthly_rainfall(monthly_mm)?;
        let mut values = [0.0; 12];
        values.copy_from_slice(monthly_mm);
        Ok(Self { monthly_mm: values })
    }

    pub fn months(&self) -> &[f64; 12] {
        &self.monthly_mm
    }

    /// Rainfall for a 1-based month number
    pub fn month(&self, month: u32) -> Option<f64> {
        let idx = usize::try_from(month).ok()?.checked_sub(1)?;
        self.monthly_mm.get(idx).copied()
    }

    /// Climatological baseline for a location, before any forecast blending
    pub fn baseline(latitude: f64, longitude: f64) -> Self {
        let base = match ClimateBand::from_latitude(latitude) {
            ClimateBand::Tropical => TROPICAL_BASELINE,
            ClimateBand::Subtropical => SUBTROPICAL_BASELINE,
            ClimateBand::Temperate => TEMPERATE_BASELINE,
        };
        let factor = if longitude.abs() > OCEANIC_LONGITUDE_THRESHOLD {
            OCEANIC_FACTOR
        } else {
            CONTINENTAL_FACTOR
        };
        Self {
            monthly_mm: base.map(|mm| round_tenth(mm * factor)),
        }
    }

    /// Baseline blended with a forecast for the current month only.
    ///
    /// The current month takes the larger of its baseline and the forecast
    /// total extrapolated to 30 days; a missing or dry forecast leaves the
    /// baseline untouched.
    pub fn estimate(
        latitude: f64,
        longitude: f64,
        current_month: u32,
        forecast: Option<&RainfallForecast>,
    ) -> Self {
        let mut series = Self::baseline(latitude, longitude);
        let forecast_total = forecast.map(RainfallForecast::total_mm).unwrap_or(0.0);
        if forecast_total > 0.0 {
            if let Some(slot) = (current_month as usize)
                .checked_sub(1)
                .and_then(|idx| series.monthly_mm.get_mut(idx))
            {
                let extrapolated = forecast_total * FORECAST_EXTRAPOLATION_FACTOR;
                *slot = round_tenth(slot.max(extrapolated));
            }
        }
        series
    }

    pub fn annual_total(&self) -> f64 {
        self.monthly_mm.iter().sum()
    }

    /// Wettest month; ties resolve to the earliest month
    pub fn wettest_month(&self) -> MonthTotal {
        let idx = self
            .monthly_mm
            .iter()
            .enumerate()
            .fold(0, |best, (i, v)| if *v > self.monthly_mm[best] { i } else { best });
        MonthTotal::at(idx, self.monthly_mm[idx])
    }

    /// Driest month; ties resolve to the earliest month
    pub fn driest_month(&self) -> MonthTotal {
        let idx = self
            .monthly_mm
            .iter()
            .enumerate()
            .fold(0, |best, (i, v)| if *v < self.monthly_mm[best] { i } else { best });
        MonthTotal::at(idx, self.monthly_mm[idx])
    }

    /// Quarter with the most rainfall; ties resolve to the earliest quarter
    pub fn dominant_quarter(&self) -> QuarterTotal {
        let totals: Vec<f64> = self.monthly_mm.chunks(3).map(|q| q.iter().sum()).collect();
        let idx = totals
            .iter()
            .enumerate()
            .fold(0, |best, (i, v)| if *v > totals[best] { i } else { best });
        QuarterTotal {
            quarter: idx as u32 + 1,
            label: QUARTER_LABELS[idx].to_string(),
            total_mm: round_tenth(totals[idx]),
        }
    }

    pub fn seasonal_analytics(&self) -> SeasonalAnalytics {
        let annual_total_mm = round_tenth(self.annual_total());
        SeasonalAnalytics {
            annual_total_mm,
            monthly_average_mm: round_tenth(annual_total_mm / 12.0),
            wettest_month: self.wettest_month(),
            driest_month: self.driest_month(),
            dominant_quarter: self.dominant_quarter(),
        }
    }
}

impl TryFrom<Vec<f64>> for RainfallSeries {
    type Error = ValidationError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&value)
    }
}

impl From<RainfallSeries> for Vec<f64> {
    fn from(series: RainfallSeries) -> Self {
        series.monthly_mm.to_vec()
    }
}

const QUARTER_LABELS: [&str; 4] = [
    "Q1 (Jan-Mar)",
    "Q2 (Apr-Jun)",
    "Q3 (Jul-Sep)",
    "Q4 (Oct-Dec)",
];

/// A month and its rainfall total
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthTotal {
    /// 1-based month number
    pub month: u32,
    pub name: String,
    pub total_mm: f64,
}

impl MonthTotal {
    fn at(idx: usize, total_mm: f64) -> Self {
        Self {
            month: idx as u32 + 1,
            name: MONTH_NAMES[idx].to_string(),
            total_mm,
        }
    }
}

/// A calendar quarter and its rainfall total
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuarterTotal {
    pub quarter: u32,
    pub label: String,
    pub total_mm: f64,
}

/// Seasonal summary derived purely from a rainfall series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonalAnalytics {
    pub annual_total_mm: f64,
    pub monthly_average_mm: f64,
    pub wettest_month: MonthTotal,
    pub driest_month: MonthTotal,
    pub dominant_quarter: QuarterTotal,
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        assert!(RainfallSeries::from_slice(&[1.0; 11]).is_err());
        assert!(RainfallSeries::from_slice(&[1.0; 13]).is_err());
        assert!(serde_json::from_str::<RainfallSeries>("[1,2,3]").is_err());
    }

    #[test]
    fn test_all_zero_series_analytics() {
        let series = RainfallSeries::from_slice(&[0.0; 12]).unwrap();
        let analytics = series.seasonal_analytics();
        assert_eq!(analytics.annual_total_mm, 0.0);
        assert_eq!(analytics.wettest_month.name, "January");
        assert_eq!(analytics.driest_month.name, "January");
        assert_eq!(analytics.dominant_quarter.quarter, 1);
    }

    #[test]
    fn test_tropical_oceanic_baseline() {
        // Mumbai: tropical, |lon| > 20
        let series = RainfallSeries::baseline(19.076, 72.8777);
        assert_eq!(series.month(1), Some(216.0));
        assert_eq!(series.month(7), Some(360.0));
    }

    #[test]
    fn test_temperate_continental_baseline() {
        // Venice: temperate, |lon| <= 20
        let series = RainfallSeries::baseline(45.4408, 12.3155);
        assert_eq!(series.month(1), Some(40.0));
        assert_eq!(series.month(7), Some(72.0));
    }

    #[test]
    fn test_forecast_only_raises_current_month() {
        let forecast = RainfallForecast {
            daily_totals_mm: vec![20.0, 30.0, 10.0, 0.0, 15.0],
        };
        let series = RainfallSeries::estimate(45.4408, 12.3155, 3, Some(&forecast));
        // 75 mm over five days extrapolates to 450 mm
        assert_eq!(series.month(3), Some(450.0));
        assert_eq!(series.month(4), Some(56.0));
    }

    #[test]
    fn test_forecast_never_lowers_baseline() {
        let forecast = RainfallForecast {
            daily_totals_mm: vec![1.0, 0.0, 0.0, 0.0, 0.0],
        };
        let series = RainfallSeries::estimate(19.076, 72.8777, 7, Some(&forecast));
        assert_eq!(series.month(7), Some(360.0));
    }

    #[test]
    fn test_dry_forecast_is_ignored() {
        let dry = RainfallForecast {
            daily_totals_mm: vec![0.0; 5],
        };
        assert_eq!(
            RainfallSeries::estimate(30.0, -95.0, 6, Some(&dry)),
            RainfallSeries::baseline(30.0, -95.0)
        );
    }

    #[test]
    fn test_seasonal_analytics() {
        let series = RainfallSeries::from_slice(&[
            10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 300.0, 80.0, 90.0, 5.0, 5.0, 5.0,
        ])
        .unwrap();
        let analytics = series.seasonal_analytics();
        assert_eq!(analytics.wettest_month.name, "July");
        assert_eq!(analytics.driest_month.name, "October");
        assert_eq!(analytics.dominant_quarter.label, "Q3 (Jul-Sep)");
        assert_eq!(analytics.dominant_quarter.total_mm, 470.0);
        assert_eq!(analytics.annual_total_mm, 695.0);
    }
}
