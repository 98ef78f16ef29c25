//! USGS earthquake GeoJSON summary feeds

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::{FeedSelector, HazardEvent, HazardFeed};

use crate::error::{AppError, AppResult};
use crate::external::weather::request_error;

const SERVICE: &str = "USGS";

/// Source of seismic events
#[async_trait]
pub trait HazardSource: Send + Sync {
    async fn fetch_hazard_events(&self, feed: FeedSelector) -> AppResult<HazardFeed>;
}

#[derive(Clone)]
pub struct UsgsClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    metadata: Option<Metadata>,
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    generated: Option<i64>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    geometry: Option<Geometry>,
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// [longitude, latitude, depth_km]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    mag: Option<f64>,
    place: Option<String>,
    time: Option<i64>,
    #[serde(default)]
    tsunami: Option<i64>,
}

impl UsgsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn feed_url(&self, feed: FeedSelector) -> String {
        format!("{}/{}", self.base_url, feed.feed_file())
    }
}

#[async_trait]
impl HazardSource for UsgsClient {
    async fn fetch_hazard_events(&self, feed: FeedSelector) -> AppResult<HazardFeed> {
        let url = self.feed_url(feed);
        tracing::debug!(feed = %feed, url = %url, "Fetching earthquake feed");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(AppError::upstream(
                SERVICE,
                format!("HTTP {}", response.status()),
            ));
        }

        let collection: FeatureCollection = response
            .json()
            .await
            .map_err(|e| AppError::upstream(SERVICE, format!("Failed to parse feed: {}", e)))?;

        Ok(convert_feed(feed, collection))
    }
}

fn millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Features without a magnitude or a usable geometry are skipped
fn convert_feature(feature: Feature) -> Option<HazardEvent> {
    let magnitude = feature.properties.mag?;
    let coords = feature.geometry?.coordinates;
    let (longitude, latitude) = (*coords.first()?, *coords.get(1)?);
    let depth_km = coords.get(2).copied().unwrap_or(0.0).max(0.0);

    Some(HazardEvent {
        id: feature.id,
        magnitude,
        depth_km,
        latitude,
        longitude,
        place: feature
            .properties
            .place
            .unwrap_or_else(|| "Unknown location".to_string()),
        observed_at: feature
            .properties
            .time
            .and_then(millis)
            .unwrap_or_else(Utc::now),
        tsunami_flag: feature.properties.tsunami.unwrap_or(0) != 0,
    })
}

fn convert_feed(feed: FeedSelector, collection: FeatureCollection) -> HazardFeed {
    let total = collection.features.len();
    let events: Vec<HazardEvent> = collection
        .features
        .into_iter()
        .filter_map(convert_feature)
        .collect();
    if events.len() < total {
        tracing::debug!(
            feed = %feed,
            skipped = total - events.len(),
            "Skipped features without magnitude or geometry"
        );
    }

    let metadata = collection.metadata;
    HazardFeed {
        feed_type: feed.as_str().to_string(),
        source: metadata
            .as_ref()
            .and_then(|m| m.title.clone())
            .unwrap_or_else(|| "USGS Earthquake Hazards Program".to_string()),
        events,
        generated_at: metadata.and_then(|m| m.generated).and_then(millis),
    }
    .dedup()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{
        "type": "FeatureCollection",
        "metadata": {"generated": 1700000000000, "title": "USGS Magnitude 4.5+ Earthquakes, Past Day", "count": 4},
        "features": [
            {"type": "Feature", "id": "us7000abcd",
             "geometry": {"type": "Point", "coordinates": [142.37, 38.3, 29.0]},
             "properties": {"mag": 7.1, "place": "off the east coast of Honshu", "time": 1699990000000, "tsunami": 1}},
            {"type": "Feature", "id": "us7000null",
             "geometry": {"type": "Point", "coordinates": [10.0, 10.0, 5.0]},
             "properties": {"mag": null, "place": "nowhere", "time": 1699990000000}},
            {"type": "Feature", "id": "us7000abcd",
             "geometry": {"type": "Point", "coordinates": [142.37, 38.3, 29.0]},
             "properties": {"mag": 7.1, "place": "off the east coast of Honshu", "time": 1699990000000, "tsunami": 1}},
            {"type": "Feature", "id": "ci4000xyz",
             "geometry": {"type": "Point", "coordinates": [-117.5, 35.7, -1.2]},
             "properties": {"mag": 4.6, "place": null, "time": 1699995000000, "tsunami": 0}}
        ]
    }"#;

    #[test]
    fn test_convert_feed() {
        let collection: FeatureCollection = serde_json::from_str(FEED).unwrap();
        let feed = convert_feed(FeedSelector::PastDayM45, collection);

        assert_eq!(feed.feed_type, "past_day_m45");
        assert_eq!(feed.events.len(), 2);
        assert!(feed.generated_at.is_some());

        let honshu = &feed.events[0];
        assert_eq!(honshu.latitude, 38.3);
        assert_eq!(honshu.longitude, 142.37);
        assert!(honshu.tsunami_flag);

        let ridgecrest = &feed.events[1];
        assert_eq!(ridgecrest.depth_km, 0.0);
        assert_eq!(ridgecrest.place, "Unknown location");
    }

    #[test]
    fn test_empty_feed_is_success() {
        let collection: FeatureCollection =
            serde_json::from_str(r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        let feed = convert_feed(FeedSelector::PastHourM45, collection);
        assert!(feed.events.is_empty());
        assert!(feed.generated_at.is_none());
    }

    #[test]
    fn test_feed_url() {
        let client = UsgsClient::new("https://example.org/summary/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.feed_url(FeedSelector::PastWeekM45),
            "https://example.org/summary/4.5_week.geojson"
        );
    }
}
