//! Common types used across the platform

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{validate_latitude, validate_longitude, ValidationError};

/// Geographic coordinates in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build coordinates, rejecting out-of-range values
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        validate_latitude(latitude)?;
        validate_longitude(longitude)?;
        Ok(Self::new(latitude, longitude))
    }
}

/// Hazards the platform can assess
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HazardType {
    Tsunami,
    Flood,
    Cyclone,
}

impl HazardType {
    pub const ALL: [HazardType; 3] = [HazardType::Tsunami, HazardType::Flood, HazardType::Cyclone];

    pub fn as_str(&self) -> &'static str {
        match self {
            HazardType::Tsunami => "tsunami",
            HazardType::Flood => "flood",
            HazardType::Cyclone => "cyclone",
        }
    }

    /// Number of learned features the hazard's predictor consumes.
    ///
    /// Cyclone assessment is rule based and has no learned feature vector.
    pub fn feature_count(&self) -> Option<usize> {
        match self {
            HazardType::Tsunami => Some(crate::features::TSUNAMI_FEATURE_NAMES.len()),
            HazardType::Flood => Some(crate::features::FLOOD_FEATURE_NAMES.len()),
            HazardType::Cyclone => None,
        }
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tsunami" => Ok(HazardType::Tsunami),
            "flood" => Ok(HazardType::Flood),
            "cyclone" => Ok(HazardType::Cyclone),
            other => Err(ValidationError::new(
                "hazard_type",
                format!("Unknown hazard type '{}'. Must be one of: tsunami, flood, cyclone", other),
            )),
        }
    }
}

/// USGS summary feed selection for the earthquake source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedSelector {
    PastHourM45,
    #[default]
    PastDayM45,
    PastHourM25,
    PastDayAll,
    PastWeekM45,
    PastMonthM45,
}

impl FeedSelector {
    pub const ALL: [FeedSelector; 6] = [
        FeedSelector::PastHourM45,
        FeedSelector::PastDayM45,
        FeedSelector::PastHourM25,
        FeedSelector::PastDayAll,
        FeedSelector::PastWeekM45,
        FeedSelector::PastMonthM45,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSelector::PastHourM45 => "past_hour_m45",
            FeedSelector::PastDayM45 => "past_day_m45",
            FeedSelector::PastHourM25 => "past_hour_m25",
            FeedSelector::PastDayAll => "past_day_all",
            FeedSelector::PastWeekM45 => "past_week_m45",
            FeedSelector::PastMonthM45 => "past_month_m45",
        }
    }

    /// File name of the GeoJSON summary feed
    pub fn feed_file(&self) -> &'static str {
        match self {
            FeedSelector::PastHourM45 => "4.5_hour.geojson",
            FeedSelector::PastDayM45 => "4.5_day.geojson",
            FeedSelector::PastHourM25 => "2.5_hour.geojson",
            FeedSelector::PastDayAll => "all_day.geojson",
            FeedSelector::PastWeekM45 => "4.5_week.geojson",
            FeedSelector::PastMonthM45 => "4.5_month.geojson",
        }
    }
}

impl fmt::Display for FeedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedSelector {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedSelector::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = FeedSelector::ALL.iter().map(|f| f.as_str()).collect();
                ValidationError::new(
                    "feed_type",
                    format!("Unknown feed selector '{}'. Must be one of: {}", s, known.join(", ")),
                )
            })
    }
}

/// Half-open time window used for alert log queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at < to)
    }
}
