//! HTTP handlers for hazard assessment endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use shared::features::RawFeatureInput;
use shared::{
    CycloneAssessment, FeedSelector, FloodAssessment, HazardType, RiskAssessment,
    UserRiskAssessment,
};
use validator::Validate;

use crate::error::AppResult;
use crate::AppState;

/// Request body for tsunami risk at a user location
#[derive(Debug, Deserialize, Validate)]
pub struct TsunamiRiskRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
    /// USGS feed selector, `past_day_m45` when omitted
    pub feed_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FloodRiskRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
    #[validate(range(min = 1900, max = 2200, message = "Year must be between 1900 and 2200"))]
    pub year: Option<i32>,
    /// Blend the weather forecast into the current month (default true)
    pub use_forecast: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CycloneRiskRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
}

/// Assess tsunami risk from recent earthquakes
pub async fn assess_tsunami_risk(
    State(state): State<AppState>,
    Json(input): Json<TsunamiRiskRequest>,
) -> AppResult<Json<UserRiskAssessment>> {
    input.validate()?;
    let feed = match input.feed_type.as_deref() {
        Some(feed) => feed.parse::<FeedSelector>()?,
        None => FeedSelector::default(),
    };
    let assessment = state
        .assessment
        .assess_tsunami_risk(input.latitude, input.longitude, feed)
        .await?;
    Ok(Json(assessment))
}

/// Assess flood risk from estimated rainfall
pub async fn assess_flood_risk(
    State(state): State<AppState>,
    Json(input): Json<FloodRiskRequest>,
) -> AppResult<Json<FloodAssessment>> {
    input.validate()?;
    let assessment = state
        .assessment
        .assess_flood_risk(
            input.latitude,
            input.longitude,
            input.year,
            input.use_forecast.unwrap_or(true),
        )
        .await?;
    Ok(Json(assessment))
}

/// Assess cyclone risk from current conditions
pub async fn assess_cyclone_risk(
    State(state): State<AppState>,
    Json(input): Json<CycloneRiskRequest>,
) -> AppResult<Json<CycloneAssessment>> {
    input.validate()?;
    let assessment = state
        .assessment
        .assess_cyclone_risk(input.latitude, input.longitude)
        .await?;
    Ok(Json(assessment))
}

/// Predict a hazard directly from raw inputs
pub async fn predict_hazard(
    State(state): State<AppState>,
    Path(hazard): Path<String>,
    Json(inputs): Json<RawFeatureInput>,
) -> AppResult<Json<RiskAssessment>> {
    let hazard: HazardType = hazard.parse()?;
    let assessment = state.assessment.predict_hazard(hazard, &inputs)?;
    Ok(Json(assessment))
}
