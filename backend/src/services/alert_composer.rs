//! Alert construction from threshold-crossing assessments

use chrono::{DateTime, Utc};
use shared::{Alert, DispatchStatus, HazardType, Location, RiskAssessment, RiskLevel, WeatherSnapshot};

/// `<HAZARD>_<LOCATION>_<YYYYmmdd_HHMMSS>`
pub fn alert_id(assessment: &RiskAssessment, location: &Location, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        assessment.hazard_type.as_str().to_ascii_uppercase(),
        sanitize_name(&location.name),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Keep alphanumerics, collapse everything else into single underscores
fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Whether an assessment should raise an alert for `location`.
///
/// Tsunami verdicts also need a user zone above "No Risk", so a likely
/// tsunami on the far side of the world does not alert.
pub fn exceeds_threshold(assessment: &RiskAssessment, location: &Location) -> bool {
    let probable = assessment
        .probability
        .is_some_and(|p| p >= location.alert_threshold);
    match assessment.hazard_type {
        HazardType::Tsunami => probable && assessment.risk_level > RiskLevel::NoRisk,
        _ => probable,
    }
}

pub fn compose_message(
    location: &Location,
    assessment: &RiskAssessment,
    weather: Option<&WeatherSnapshot>,
    at: DateTime<Utc>,
) -> String {
    let hazard = assessment.hazard_type.as_str().to_ascii_uppercase();
    let mut lines = vec![
        format!("{} ALERT for {}", hazard, location.name),
        String::new(),
        format!(
            "{} PROBABILITY: {:.1}%",
            hazard,
            assessment.probability.unwrap_or(0.0) * 100.0
        ),
        format!("LOCATION: {:.4}, {:.4}", location.latitude, location.longitude),
        format!("RISK LEVEL: {}", assessment.risk_label),
    ];
    if let Some(distance) = assessment.distance_km {
        lines.push(format!("DISTANCE TO EVENT: {:.0} km", distance));
    }
    if let Some(weather) = weather {
        lines.push(format!("CURRENT CONDITIONS: {}", weather.description));
        lines.push(format!("TEMPERATURE: {:.1}°C", weather.temperature_celsius));
        lines.push(format!("HUMIDITY: {:.0}%", weather.humidity_percent));
        lines.push(format!("PRECIPITATION: {:.1}mm/hr", weather.precipitation_mm));
    }
    lines.push(format!("TIME: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    lines.push(String::new());
    lines.push("RECOMMENDED ACTIONS:".to_string());
    lines.extend(assessment.recommendations.iter().map(|r| format!("- {}", r)));
    lines.push(String::new());
    lines.push("This alert was generated automatically by the WaveGuard monitoring system.".to_string());
    lines.join("\n")
}

/// Bind an assessment to its location as a pending alert
pub fn compose_alert(
    location: &Location,
    assessment: RiskAssessment,
    raw_signal: serde_json::Value,
    weather: Option<&WeatherSnapshot>,
    at: DateTime<Utc>,
) -> Alert {
    Alert {
        alert_id: alert_id(&assessment, location, at),
        message: compose_message(location, &assessment, weather, at),
        location: location.clone(),
        assessment,
        raw_signal,
        dispatched: false,
        dispatch_status: DispatchStatus::Pending,
        dispatch_error: None,
        created_at: at,
    }
}
