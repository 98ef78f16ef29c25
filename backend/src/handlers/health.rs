//! Health check and model info handlers

use axum::{extract::State, Json};
use serde::Serialize;
use shared::HazardType;

use crate::services::model_registry::RegistryInfo;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `healthy` when at least one model is loaded, `degraded` otherwise
    pub status: String,
    pub version: String,
    pub models_loaded: usize,
    pub available_models: Vec<HazardType>,
    pub weather_source: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let models = state.assessment.models();
    let status = if models.is_empty() { "degraded" } else { "healthy" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models_loaded: models.len(),
        available_models: models.available(),
        weather_source: state.assessment.weather().name().to_string(),
    })
}

/// Loaded model metadata
pub async fn models_info(State(state): State<AppState>) -> Json<RegistryInfo> {
    Json(state.assessment.models().info())
}
