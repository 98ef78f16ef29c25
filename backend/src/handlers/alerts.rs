//! HTTP handlers for the alert log

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{Alert, TimeRange, ValidationError};

use crate::error::AppResult;
use crate::services::AlertQuery;
use crate::AppState;

/// Query parameters for logged alerts
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub location: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// List logged alerts, oldest first
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> AppResult<Json<Vec<Alert>>> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from >= to {
            return Err(ValidationError::new("from", "'from' must be earlier than 'to'").into());
        }
    }

    let alerts = state
        .alert_log
        .query(&AlertQuery {
            location: query.location,
            range: TimeRange {
                from: query.from,
                to: query.to,
            },
            limit: query.limit,
        })
        .await?;
    Ok(Json(alerts))
}
