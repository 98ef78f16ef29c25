//! Earthquake event models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Coordinates;

/// An observed earthquake as reported by the hazard feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HazardEvent {
    /// Source-provided identifier, stable across polling cycles
    pub id: String,
    pub magnitude: f64,
    pub depth_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub place: String,
    pub observed_at: DateTime<Utc>,
    /// Source tsunami flag (USGS sets 1 for large oceanic events)
    pub tsunami_flag: bool,
}

impl HazardEvent {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Result of polling a hazard feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardFeed {
    pub feed_type: String,
    pub source: String,
    pub events: Vec<HazardEvent>,
    /// When the source generated the feed
    pub generated_at: Option<DateTime<Utc>>,
}

impl HazardFeed {
    /// Drop events already seen in this feed (same source id), keeping the first
    pub fn dedup(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.events.retain(|e| seen.insert(e.id.clone()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str) -> HazardEvent {
        HazardEvent {
            id: id.to_string(),
            magnitude: 5.0,
            depth_km: 10.0,
            latitude: 0.0,
            longitude: 0.0,
            place: "test".to_string(),
            observed_at: Utc::now(),
            tsunami_flag: false,
        }
    }

    #[test]
    fn test_feed_dedup_keeps_first_occurrence() {
        let feed = HazardFeed {
            feed_type: "past_day_m45".to_string(),
            source: "test".to_string(),
            events: vec![event("a"), event("b"), event("a")],
            generated_at: None,
        }
        .dedup();
        let ids: Vec<&str> = feed.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
