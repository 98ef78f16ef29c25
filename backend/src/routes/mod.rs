//! Route definitions for the WaveGuard API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/models", get(handlers::models_info))
        // Assessments
        .nest("/assess", assessment_routes())
        .route("/predict/:hazard", post(handlers::predict_hazard))
        // Raw feeds and alert history
        .route("/earthquakes/:feed", get(handlers::get_earthquakes))
        .route("/alerts", get(handlers::list_alerts))
}

fn assessment_routes() -> Router<AppState> {
    Router::new()
        .route("/tsunami-risk", post(handlers::assess_tsunami_risk))
        .route("/flood-risk", post(handlers::assess_flood_risk))
        .route("/cyclone-risk", post(handlers::assess_cyclone_risk))
}
