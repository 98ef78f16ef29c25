//! Monitored location models

use serde::{Deserialize, Serialize};

use crate::types::{Coordinates, FeedSelector, HazardType};
use crate::validation::{
    validate_alert_threshold, validate_latitude, validate_longitude, ValidationError,
};

/// Probability at or above which an alert is dispatched
pub const DEFAULT_ALERT_THRESHOLD: f64 = 0.64;

/// Default time between monitoring cycles (one hour)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3600;

/// A location under scheduled monitoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Hazards evaluated for this location every cycle
    #[serde(default = "default_hazards")]
    pub hazards: Vec<HazardType>,
    /// Earthquake feed used when tsunami is monitored
    #[serde(default)]
    pub feed: FeedSelector,
}

fn default_alert_threshold() -> f64 {
    DEFAULT_ALERT_THRESHOLD
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_hazards() -> Vec<HazardType> {
    vec![HazardType::Flood]
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            hazards: default_hazards(),
            feed: FeedSelector::default(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }

    /// Validate a location loaded from configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "Location name is required"));
        }
        validate_latitude(self.latitude)?;
        validate_longitude(self.longitude)?;
        validate_alert_threshold(self.alert_threshold)?;
        if self.poll_interval_secs == 0 {
            return Err(ValidationError::new(
                "poll_interval_secs",
                "Poll interval must be greater than zero",
            ));
        }
        if self.hazards.is_empty() {
            return Err(ValidationError::new(
                "hazards",
                format!("Location '{}' must monitor at least one hazard", self.name),
            ));
        }
        Ok(())
    }
}
