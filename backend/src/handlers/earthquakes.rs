//! Raw earthquake feed passthrough

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{FeedSelector, HazardFeed};

use crate::error::AppResult;
use crate::AppState;

/// Fetch a USGS feed, deduplicated and with unusable features dropped
pub async fn get_earthquakes(
    State(state): State<AppState>,
    Path(feed): Path<String>,
) -> AppResult<Json<HazardFeed>> {
    let feed: FeedSelector = feed.parse()?;
    let events = state.assessment.hazards().fetch_hazard_events(feed).await?;
    Ok(Json(events))
}
