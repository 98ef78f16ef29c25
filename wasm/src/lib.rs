//! WebAssembly module for the WaveGuard dashboard
//!
//! Client-side versions of the pure risk rules, so the map can shade
//! distances and risk zones without a server round trip:
//! - Great-circle distance and oceanic checks
//! - Tsunami user zoning
//! - Flood risk levels
//! - Cyclone scoring from observed conditions
//! - Seasonal rainfall baselines

use shared::cyclone::CycloneScoringTable;
use shared::features::CycloneConditions;
use shared::risk::{flood_level, tsunami_user_zone};
use shared::{geo, Coordinates, HazardType, RainfallSeries};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("WaveGuard risk rules loaded"));
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Haversine distance in kilometres
#[wasm_bindgen]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64, JsValue> {
    let a = Coordinates::try_new(lat1, lon1).map_err(to_js_error)?;
    let b = Coordinates::try_new(lat2, lon2).map_err(to_js_error)?;
    Ok(geo::distance_km(a, b))
}

#[wasm_bindgen]
pub fn is_oceanic(latitude: f64, longitude: f64) -> bool {
    geo::is_oceanic(latitude, longitude)
}

/// Tsunami risk zone label for a user `distance_km` from an event
#[wasm_bindgen]
pub fn tsunami_zone(probability: f64, predicted: bool, distance_km: f64) -> String {
    let probability = shared::clamp_probability(probability);
    tsunami_user_zone(probability, predicted, distance_km.max(0.0))
        .label(HazardType::Tsunami)
        .to_string()
}

#[wasm_bindgen]
pub fn flood_risk_level(probability: f64) -> String {
    flood_level(shared::clamp_probability(probability))
        .label(HazardType::Flood)
        .to_string()
}

/// Score cyclone conditions; returns the breakdown as JSON
#[wasm_bindgen]
pub fn cyclone_score(conditions_json: &str) -> Result<String, JsValue> {
    let conditions: CycloneConditions = serde_json::from_str(conditions_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid conditions JSON: {}", e)))?;
    conditions.validate().map_err(to_js_error)?;

    let score = CycloneScoringTable::default().score(&conditions);
    serde_json::to_string(&score).map_err(to_js_error)
}

/// Climatological monthly rainfall (mm, Jan..Dec) for a location
#[wasm_bindgen]
pub fn rainfall_baseline(latitude: f64, longitude: f64) -> Vec<f64> {
    RainfallSeries::baseline(latitude, longitude).months().to_vec()
}

/// Wettest/driest month and dominant quarter for twelve monthly totals, as JSON
#[wasm_bindgen]
pub fn seasonal_analytics(monthly_mm: Vec<f64>) -> Result<String, JsValue> {
    let series = RainfallSeries::from_slice(&monthly_mm).map_err(to_js_error)?;
    serde_json::to_string(&series.seasonal_analytics()).map_err(to_js_error)
}
