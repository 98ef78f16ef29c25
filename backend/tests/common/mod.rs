//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use shared::cyclone::CycloneScoringTable;
use shared::features::{FLOOD_FEATURE_NAMES, TSUNAMI_FEATURE_NAMES};
use shared::predictor::{Classifier, Predictor, ProbabilityModel};
use shared::{
    Alert, FeedSelector, HazardEvent, HazardFeed, HazardType, RainfallForecast, WeatherSnapshot,
};
use waveguard::error::{AppError, AppResult};
use waveguard::external::{HazardSource, WeatherSource};
use waveguard::services::{AlertSink, AssessmentService, Clock, ModelRegistry};

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 14, 9, 5, 3).unwrap()
}

// ============================================================================
// Models
// ============================================================================

/// Predictor returning the same probability for any input
#[derive(Debug)]
pub struct ConstantModel {
    pub probability: f64,
    pub names: Vec<String>,
}

impl Classifier for ConstantModel {
    fn name(&self) -> &str {
        "constant"
    }

    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn classify(&self, _features: &[f64]) -> bool {
        self.probability >= 0.5
    }
}

impl ProbabilityModel for ConstantModel {
    fn probability(&self, _features: &[f64]) -> f64 {
        self.probability
    }
}

pub fn constant(hazard: HazardType, probability: f64) -> Predictor {
    let names: Vec<String> = match hazard {
        HazardType::Tsunami => TSUNAMI_FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        _ => FLOOD_FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
    };
    Predictor::Probabilistic(Arc::new(ConstantModel { probability, names }))
}

// ============================================================================
// Sources
// ============================================================================

pub fn calm_weather() -> WeatherSnapshot {
    WeatherSnapshot {
        temperature_celsius: 24.0,
        humidity_percent: 55.0,
        pressure_hpa: 1018.0,
        wind_speed_mps: 3.0,
        wind_direction_deg: 90.0,
        visibility_km: 10.0,
        precipitation_mm: 0.0,
        clouds_percent: 20.0,
        description: "few clouds".to_string(),
        observed_at: start_time(),
    }
}

/// Weather source with fixed conditions; counts current-weather fetches
pub struct StubWeather {
    pub snapshot: Option<WeatherSnapshot>,
    pub calls: AtomicUsize,
}

impl StubWeather {
    pub fn fixed(snapshot: WeatherSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every fetch fails as an upstream error
    pub fn failing() -> Self {
        Self {
            snapshot: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for StubWeather {
    fn name(&self) -> &str {
        "Stub"
    }

    async fn fetch_current(&self, _latitude: f64, _longitude: f64) -> AppResult<WeatherSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .clone()
            .ok_or_else(|| AppError::upstream("Stub", "connection refused"))
    }

    async fn fetch_forecast_rainfall(
        &self,
        _latitude: f64,
        _longitude: f64,
        days: u32,
    ) -> AppResult<RainfallForecast> {
        match self.snapshot {
            Some(_) => Ok(RainfallForecast {
                daily_totals_mm: vec![12.0; days as usize],
            }),
            None => Err(AppError::upstream("Stub", "connection refused")),
        }
    }
}

pub struct StubFeed {
    pub events: Vec<HazardEvent>,
}

#[async_trait]
impl HazardSource for StubFeed {
    async fn fetch_hazard_events(&self, feed: FeedSelector) -> AppResult<HazardFeed> {
        Ok(HazardFeed {
            feed_type: feed.as_str().to_string(),
            source: "Stub".to_string(),
            events: self.events.clone(),
            generated_at: Some(start_time()),
        }
        .dedup())
    }
}

pub fn quake(id: &str, magnitude: f64, latitude: f64, longitude: f64) -> HazardEvent {
    HazardEvent {
        id: id.to_string(),
        magnitude,
        depth_km: 12.0,
        latitude,
        longitude,
        place: format!("near {}", id),
        observed_at: start_time(),
        tsunami_flag: magnitude >= 7.0,
    }
}

// ============================================================================
// Sinks and clocks
// ============================================================================

/// Sink that rejects every alert
pub struct FailingSink;

#[async_trait]
impl AlertSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn deliver(&self, _alert: &Alert) -> AppResult<()> {
        Err(AppError::Dispatch("webhook returned 503".to_string()))
    }
}

/// Clock whose sleeps never finish
pub struct FrozenClock;

#[async_trait]
impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        start_time()
    }

    async fn sleep(&self, _duration: Duration) {
        std::future::pending::<()>().await;
    }
}

pub fn assessment_service(
    models: ModelRegistry,
    feed: Vec<HazardEvent>,
    weather: Arc<StubWeather>,
) -> AssessmentService {
    AssessmentService::new(
        Arc::new(models),
        Arc::new(StubFeed { events: feed }),
        weather.clone(),
        weather,
        CycloneScoringTable::default(),
        5,
    )
}
