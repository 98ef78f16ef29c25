//! Recommendation and monitoring templates keyed by risk level

use std::time::Duration;

use crate::features::TsunamiInput;
use crate::models::{RiskLevel, SeasonalAnalytics};
use crate::types::HazardType;

/// Guidance class shared by every hazard
fn common(level: RiskLevel) -> &'static [&'static str] {
    match level {
        RiskLevel::Extreme => &[
            "Follow evacuation orders from local authorities immediately",
            "Move to designated shelters or higher ground",
            "Keep emergency supplies and documents with you",
        ],
        RiskLevel::High => &[
            "Prepare to evacuate and review evacuation routes",
            "Identify the nearest shelter or high ground",
            "Stock emergency supplies for at least 3 days",
        ],
        RiskLevel::Medium => &[
            "Stay alert and monitor official warnings closely",
            "Check that your emergency kit is ready",
        ],
        RiskLevel::Low => &[
            "Monitor local conditions for changes",
            "Stay informed about evacuation routes in your area",
        ],
        RiskLevel::VeryLow | RiskLevel::NoRisk => &[
            "No immediate action required",
            "Continue normal activities while staying informed",
        ],
    }
}

fn hazard_specific(hazard: HazardType, level: RiskLevel) -> &'static [&'static str] {
    match (hazard, level) {
        (HazardType::Tsunami, RiskLevel::Extreme | RiskLevel::High) => &[
            "Move inland and away from the coast now",
            "Do not return to the shore until officials give the all clear",
        ],
        (HazardType::Tsunami, RiskLevel::Medium | RiskLevel::Low) => &[
            "Stay away from beaches, harbours and river mouths",
            "Watch for unusual sea level changes",
        ],
        (HazardType::Tsunami, _) => &["Know the tsunami warning signs for your coastline"],

        (HazardType::Flood, RiskLevel::Extreme | RiskLevel::High) => &[
            "Avoid low-lying areas and flood-prone zones",
            "Move vehicles to higher ground",
            "Stock emergency supplies (water, food, flashlight, battery radio)",
        ],
        (HazardType::Flood, RiskLevel::Medium | RiskLevel::Low) => &[
            "Clear drains and gutters around your property",
            "Avoid walking or driving through flood water",
        ],
        (HazardType::Flood, _) => &["Keep an eye on rainfall forecasts"],

        (HazardType::Cyclone, RiskLevel::Extreme) => &[
            "IMMEDIATE: Prepare for hurricane/typhoon conditions",
            "Secure all outdoor items and board up windows",
            "Stock emergency supplies for at least 7 days",
        ],
        (HazardType::Cyclone, RiskLevel::High) => &[
            "Prepare for severe tropical storm conditions",
            "Secure outdoor furniture and equipment",
        ],
        (HazardType::Cyclone, RiskLevel::Medium) => &[
            "Prepare for possible tropical storm conditions",
            "Check and secure loose outdoor items",
        ],
        (HazardType::Cyclone, RiskLevel::Low) => &["Ensure emergency kit is ready"],
        (HazardType::Cyclone, _) => &["Monitor local weather updates and warnings"],
    }
}

/// Recommendation list for a verdict; never empty
pub fn recommendations(hazard: HazardType, level: RiskLevel) -> Vec<String> {
    common(level)
        .iter()
        .chain(hazard_specific(hazard, level))
        .map(|s| s.to_string())
        .collect()
}

/// Suggested recheck interval: shorter at higher risk
pub fn monitoring_interval(level: RiskLevel) -> Duration {
    match level {
        RiskLevel::Extreme => Duration::from_secs(30 * 60),
        RiskLevel::High => Duration::from_secs(2 * 3600),
        RiskLevel::Medium => Duration::from_secs(4 * 3600),
        RiskLevel::Low | RiskLevel::VeryLow | RiskLevel::NoRisk => Duration::from_secs(6 * 3600),
    }
}

fn describe_interval(interval: Duration) -> String {
    let minutes = interval.as_secs() / 60;
    if minutes < 60 {
        format!("{} minutes", minutes)
    } else {
        format!("{} hours", minutes / 60)
    }
}

pub fn monitoring_advice(hazard: HazardType, level: RiskLevel) -> Vec<String> {
    let mut advice = vec![format!(
        "Check conditions every {}",
        describe_interval(monitoring_interval(level))
    )];
    let source = match hazard {
        HazardType::Tsunami => "Monitor official tsunami warning centres",
        HazardType::Flood => "Monitor local flood warnings and river levels",
        HazardType::Cyclone => "Monitor official meteorological services",
    };
    match level {
        RiskLevel::Extreme => {
            advice.push("Follow emergency management broadcasts".to_string());
            advice.push("Watch for rapid escalation updates".to_string());
        }
        RiskLevel::High => advice.push("Watch for official warnings".to_string()),
        RiskLevel::Medium => advice.push("Watch for weather advisories".to_string()),
        _ => {}
    }
    advice.push(source.to_string());
    advice
}

// ============================================================================
// Contributing factor narratives
// ============================================================================

pub fn tsunami_factors(input: &TsunamiInput) -> Vec<String> {
    let magnitude = if input.magnitude >= 8.0 {
        "Great earthquake, capable of ocean-wide tsunamis"
    } else if input.is_major() {
        "Major earthquake, capable of regional tsunamis"
    } else if input.magnitude >= 6.0 {
        "Strong earthquake, local tsunami possible"
    } else {
        "Moderate earthquake, tsunami unlikely"
    };
    let depth = if input.is_shallow() {
        "Shallow focus displaces more of the sea floor"
    } else {
        "Deep focus limits sea floor displacement"
    };
    let geography = if crate::geo::is_oceanic(input.latitude, input.longitude) {
        "Oceanic epicentre"
    } else {
        "Continental epicentre"
    };
    vec![
        format!("Magnitude {:.1}: {}", input.magnitude, magnitude),
        format!("Depth {:.0} km: {}", input.depth, depth),
        format!(
            "{} at {:.2}, {:.2}",
            geography, input.latitude, input.longitude
        ),
    ]
}

pub fn flood_factors(analytics: &SeasonalAnalytics) -> Vec<String> {
    vec![
        format!("Annual rainfall {:.1} mm", analytics.annual_total_mm),
        format!(
            "Wettest month {} ({:.1} mm)",
            analytics.wettest_month.name, analytics.wettest_month.total_mm
        ),
        format!(
            "Driest month {} ({:.1} mm)",
            analytics.driest_month.name, analytics.driest_month.total_mm
        ),
        format!(
            "Dominant season {} ({:.1} mm)",
            analytics.dominant_quarter.label, analytics.dominant_quarter.total_mm
        ),
    ]
}
