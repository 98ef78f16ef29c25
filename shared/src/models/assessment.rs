//! Risk assessment and alert records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{HazardEvent, Location, SeasonalAnalytics, WeatherSnapshot, RainfallSeries};
use crate::types::{Coordinates, HazardType};

// ============================================================================
// Risk Level
// ============================================================================

/// Ordinal risk category.
///
/// `NoRisk` is the bottom rank used by the tsunami and cyclone tables and
/// compares equal in rank to `VeryLow`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    NoRisk,
    VeryLow,
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    pub fn rank(&self) -> u8 {
        match self {
            RiskLevel::NoRisk | RiskLevel::VeryLow => 0,
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
            RiskLevel::Extreme => 4,
        }
    }

    /// Human label in the vocabulary of the given hazard
    pub fn label(&self, hazard: HazardType) -> &'static str {
        match hazard {
            HazardType::Flood => match self {
                RiskLevel::NoRisk | RiskLevel::VeryLow => "Very Low",
                RiskLevel::Low => "Low",
                RiskLevel::Medium => "Medium",
                RiskLevel::High => "High",
                RiskLevel::Extreme => "Extreme",
            },
            HazardType::Cyclone => match self {
                RiskLevel::NoRisk | RiskLevel::VeryLow => "No Risk",
                RiskLevel::Low => "Low Risk",
                RiskLevel::Medium => "Moderate Risk",
                RiskLevel::High => "High Risk",
                RiskLevel::Extreme => "Extreme Risk",
            },
            HazardType::Tsunami => match self {
                RiskLevel::NoRisk | RiskLevel::VeryLow => "No Risk",
                RiskLevel::Low => "Low Risk",
                RiskLevel::Medium => "Medium Risk",
                RiskLevel::High | RiskLevel::Extreme => "High Risk",
            },
        }
    }
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// How much trust to place in an assessment's probability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Probability produced by a probability-capable model
    Calibrated,
    /// Probability is a classify-only label mapped to 1.0 / 0.0
    Degraded,
    /// Deterministic rule table, no learned model involved
    RuleBased,
}

// ============================================================================
// Risk Assessment
// ============================================================================

/// Immutable output of one hazard evaluation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub hazard_type: HazardType,
    pub probability: Option<f64>,
    pub risk_level: RiskLevel,
    /// Label of `risk_level` in the hazard's vocabulary
    pub risk_label: String,
    pub distance_km: Option<f64>,
    pub confidence: Confidence,
    pub contributing_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub monitoring_advice: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Hazard-specific assessment records
// ============================================================================

/// Per-event tsunami verdict
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRisk {
    pub event: HazardEvent,
    pub tsunami_probability: f64,
    pub tsunami_predicted: bool,
    /// Risk of the event itself, independent of the user
    pub event_risk_level: RiskLevel,
    pub distance_km: f64,
    /// Risk for the user given distance to the event
    pub risk_zone: RiskLevel,
    pub confidence: Confidence,
}

/// The strongest risk found for a user across a batch of events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighestRisk {
    pub risk_zone: RiskLevel,
    pub risk_label: String,
    pub distance_km: Option<f64>,
    pub reasoning: String,
    pub earthquake: Option<EventRisk>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedInfo {
    pub feed_type: String,
    pub source: String,
    pub total_earthquakes_in_feed: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Tsunami risk for a user location against a live earthquake feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRiskAssessment {
    pub user_location: Coordinates,
    pub earthquake_count: usize,
    pub earthquakes_analyzed: Vec<EventRisk>,
    pub highest_risk: HighestRisk,
    pub overall_status: String,
    pub assessment: RiskAssessment,
    pub feed_info: FeedInfo,
    pub timestamp: DateTime<Utc>,
}

/// Flood risk with the rainfall series it was computed from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloodAssessment {
    pub location: Coordinates,
    pub year: i32,
    pub rainfall: RainfallSeries,
    pub seasonal_analytics: SeasonalAnalytics,
    /// Whether a live forecast adjusted the current month
    pub forecast_applied: bool,
    pub assessment: RiskAssessment,
    pub data_source: String,
}

/// Decomposed cyclone score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycloneFactors {
    pub geographic_risk: f64,
    pub pressure_risk: f64,
    pub wind_risk: f64,
    pub humidity_risk: f64,
    pub combined_risk: f64,
    pub pressure_factor: String,
    pub wind_factor: String,
    pub combined_assessment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CyclonePrediction {
    pub prediction: bool,
    pub risk_level: RiskLevel,
    pub risk_label: String,
    pub confidence: f64,
    /// Expected wind speed if conditions intensify (m/s)
    pub predicted_wind_speed: f64,
    pub risk_factors: CycloneFactors,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycloneAssessment {
    pub location: Coordinates,
    pub weather_data: WeatherSnapshot,
    pub cyclone_prediction: CyclonePrediction,
    pub assessment: RiskAssessment,
    pub data_source: String,
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Pending,
    Delivered,
    DispatchFailed,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Pending => "pending",
            DispatchStatus::Delivered => "delivered",
            DispatchStatus::DispatchFailed => "dispatch_failed",
        }
    }
}

impl std::str::FromStr for DispatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DispatchStatus::Pending),
            "delivered" => Ok(DispatchStatus::Delivered),
            "dispatch_failed" => Ok(DispatchStatus::DispatchFailed),
            other => Err(format!("Unknown dispatch status: {}", other)),
        }
    }
}

/// A threshold-crossing assessment bound to a monitored location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub alert_id: String,
    pub location: Location,
    pub assessment: RiskAssessment,
    /// Inputs the assessment was computed from
    pub raw_signal: serde_json::Value,
    pub message: String,
    pub dispatched: bool,
    pub dispatch_status: DispatchStatus,
    pub dispatch_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn mark_delivered(&mut self) {
        self.dispatched = true;
        self.dispatch_status = DispatchStatus::Delivered;
        self.dispatch_error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.dispatched = false;
        self.dispatch_status = DispatchStatus::DispatchFailed;
        self.dispatch_error = Some(error.into());
    }
}

/// Result of handing an alert to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    /// Logged, but the sink rejected it or was unreachable
    Failed(String),
    /// Already logged under this alert id; nothing was resent
    Duplicate,
}
