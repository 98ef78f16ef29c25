//! Hazard assessment operations
//!
//! Each operation runs the same pipeline: fetch signals from the external
//! sources, engineer a feature vector, consult the hazard model (or the
//! cyclone rule table), then map the result to a risk level with
//! recommendations attached.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use shared::cyclone::CycloneScoringTable;
use shared::features::{flood_features, tsunami_features, CycloneConditions, RawFeatureInput, TsunamiInput};
use shared::predictor::Predictor;
use shared::recommendations::{
    flood_factors, monitoring_advice, recommendations, tsunami_factors,
};
use shared::risk::{
    flood_level, overall_status, tsunami_event_level, tsunami_user_zone, tsunami_zone_reasoning,
    RiskTracker,
};
use shared::{
    geo, validate_year, Confidence, Coordinates, CycloneAssessment, EventRisk, FeedInfo,
    FeedSelector, FloodAssessment, HazardEvent, HazardFeed, HazardType, HighestRisk, RainfallSeries,
    RainfallForecast, RiskAssessment, RiskLevel, UserRiskAssessment, WeatherSnapshot,
};

use crate::error::AppResult;
use crate::external::{HazardSource, WeatherSource};
use crate::services::ModelRegistry;

/// Assemble a risk assessment with the templated guidance for its level
pub fn build_assessment(
    hazard: HazardType,
    probability: Option<f64>,
    risk_level: RiskLevel,
    distance_km: Option<f64>,
    confidence: Confidence,
    contributing_factors: Vec<String>,
) -> RiskAssessment {
    RiskAssessment {
        hazard_type: hazard,
        probability,
        risk_level,
        risk_label: risk_level.label(hazard).to_string(),
        distance_km,
        confidence,
        contributing_factors,
        recommendations: recommendations(hazard, risk_level),
        monitoring_advice: monitoring_advice(hazard, risk_level),
        timestamp: Utc::now(),
    }
}

/// Assessment service over the configured sources and models
#[derive(Clone)]
pub struct AssessmentService {
    models: Arc<ModelRegistry>,
    hazards: Arc<dyn HazardSource>,
    weather: Arc<dyn WeatherSource>,
    /// Used by the cyclone route when the live source is unavailable
    fallback_weather: Arc<dyn WeatherSource>,
    cyclone_table: Arc<CycloneScoringTable>,
    forecast_days: u32,
}

impl AssessmentService {
    pub fn new(
        models: Arc<ModelRegistry>,
        hazards: Arc<dyn HazardSource>,
        weather: Arc<dyn WeatherSource>,
        fallback_weather: Arc<dyn WeatherSource>,
        cyclone_table: CycloneScoringTable,
        forecast_days: u32,
    ) -> Self {
        Self {
            models,
            hazards,
            weather,
            fallback_weather,
            cyclone_table: Arc::new(cyclone_table),
            forecast_days,
        }
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn hazards(&self) -> &Arc<dyn HazardSource> {
        &self.hazards
    }

    pub fn weather(&self) -> &Arc<dyn WeatherSource> {
        &self.weather
    }

    // ========================================================================
    // Tsunami
    // ========================================================================

    /// Score every event in `feed` against a user location
    pub async fn assess_tsunami_risk(
        &self,
        latitude: f64,
        longitude: f64,
        feed: FeedSelector,
    ) -> AppResult<UserRiskAssessment> {
        let user = Coordinates::try_new(latitude, longitude)?;
        self.models.require(HazardType::Tsunami)?;
        let hazard_feed = self.hazards.fetch_hazard_events(feed).await?;
        self.tsunami_from_feed(user, &hazard_feed)
    }

    /// Score an already-fetched feed against a user location
    pub fn tsunami_from_feed(
        &self,
        user: Coordinates,
        hazard_feed: &HazardFeed,
    ) -> AppResult<UserRiskAssessment> {
        let predictor = self.models.require(HazardType::Tsunami)?;
        let analyzed = evaluate_events(predictor, user, &hazard_feed.events);
        tracing::info!(
            feed = %hazard_feed.feed_type,
            events = hazard_feed.events.len(),
            analyzed = analyzed.len(),
            "Assessed tsunami risk"
        );

        let feed_info = FeedInfo {
            feed_type: hazard_feed.feed_type.clone(),
            source: hazard_feed.source.clone(),
            total_earthquakes_in_feed: hazard_feed.events.len(),
            last_updated: hazard_feed.generated_at,
        };

        Ok(summarize_user_risk(user, analyzed, feed_info))
    }

    // ========================================================================
    // Flood
    // ========================================================================

    /// Flood risk from estimated monthly rainfall.
    ///
    /// A failed forecast fetch degrades to the climatological baseline.
    pub async fn assess_flood_risk(
        &self,
        latitude: f64,
        longitude: f64,
        year: Option<i32>,
        use_forecast: bool,
    ) -> AppResult<FloodAssessment> {
        Coordinates::try_new(latitude, longitude)?;
        if let Some(year) = year {
            validate_year(year)?;
        }
        self.models.require(HazardType::Flood)?;

        let forecast = if use_forecast {
            self.fetch_forecast_or_baseline(latitude, longitude).await
        } else {
            None
        };
        self.flood_from_forecast(latitude, longitude, year, forecast.as_ref(), Utc::now())
    }

    /// Forecast rainfall, or `None` when the fetch fails
    pub async fn fetch_forecast_or_baseline(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Option<RainfallForecast> {
        match self
            .weather
            .fetch_forecast_rainfall(latitude, longitude, self.forecast_days)
            .await
        {
            Ok(forecast) => Some(forecast),
            Err(e) => {
                tracing::warn!(
                    latitude,
                    longitude,
                    error = %e,
                    "Rainfall forecast unavailable, using baseline only"
                );
                None
            }
        }
    }

    /// Flood verdict for the rainfall estimated from `forecast`.
    ///
    /// The forecast lands in the month of `at`, which also supplies the
    /// default year.
    pub fn flood_from_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        year: Option<i32>,
        forecast: Option<&RainfallForecast>,
        at: DateTime<Utc>,
    ) -> AppResult<FloodAssessment> {
        let location = Coordinates::try_new(latitude, longitude)?;
        let year = year.unwrap_or_else(|| at.year());
        validate_year(year)?;
        let predictor = self.models.require(HazardType::Flood)?;

        let rainfall = RainfallSeries::estimate(latitude, longitude, at.month(), forecast);
        let forecast_applied = forecast.is_some_and(|f| f.total_mm() > 0.0);
        let features = flood_features(year, &rainfall)?;
        let estimate = predictor.estimate(&features)?;
        let level = flood_level(estimate.probability);
        let analytics = rainfall.seasonal_analytics();

        let mut factors = flood_factors(&analytics);
        if let Some(forecast) = forecast.filter(|_| forecast_applied) {
            factors.push(format!(
                "Forecast rainfall {:.1} mm over the next {} days",
                forecast.total_mm(),
                forecast.days()
            ));
        }

        tracing::info!(
            latitude,
            longitude,
            probability = estimate.probability,
            risk_level = ?level,
            forecast_applied,
            "Assessed flood risk"
        );

        Ok(FloodAssessment {
            location,
            year,
            seasonal_analytics: analytics,
            forecast_applied,
            assessment: build_assessment(
                HazardType::Flood,
                Some(estimate.probability),
                level,
                None,
                estimate.confidence,
                factors,
            ),
            data_source: if forecast_applied {
                format!("{} forecast + climatological baseline", self.weather.name())
            } else {
                "climatological baseline".to_string()
            },
            rainfall,
        })
    }

    // ========================================================================
    // Cyclone
    // ========================================================================

    /// Cyclone risk from current conditions.
    ///
    /// Falls back to simulated conditions when the live source fails.
    pub async fn assess_cyclone_risk(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> AppResult<CycloneAssessment> {
        Coordinates::try_new(latitude, longitude)?;
        let (weather, source) = match self.weather.fetch_current(latitude, longitude).await {
            Ok(weather) => (weather, self.weather.name().to_string()),
            Err(e) => {
                tracing::warn!(
                    latitude,
                    longitude,
                    error = %e,
                    "Live weather unavailable, using simulated conditions"
                );
                let weather = self
                    .fallback_weather
                    .fetch_current(latitude, longitude)
                    .await?;
                (weather, format!("{} (live data unavailable)", self.fallback_weather.name()))
            }
        };
        self.cyclone_from_weather(latitude, longitude, weather, source)
    }

    /// Score already-fetched conditions with the cyclone table
    pub fn cyclone_from_weather(
        &self,
        latitude: f64,
        longitude: f64,
        weather: WeatherSnapshot,
        data_source: String,
    ) -> AppResult<CycloneAssessment> {
        let conditions = CycloneConditions::from_snapshot(latitude, longitude, &weather);
        conditions.validate()?;
        let score = self.cyclone_table.score(&conditions);

        tracing::info!(
            latitude,
            longitude,
            combined = score.combined,
            risk_level = ?score.level,
            "Assessed cyclone risk"
        );

        Ok(CycloneAssessment {
            location: Coordinates::new(latitude, longitude),
            cyclone_prediction: score.prediction(),
            assessment: build_assessment(
                HazardType::Cyclone,
                Some(score.combined),
                score.level,
                None,
                Confidence::RuleBased,
                score.contributing_factors,
            ),
            weather_data: weather,
            data_source,
        })
    }

    // ========================================================================
    // Direct prediction
    // ========================================================================

    /// Non-geospatial prediction from raw inputs
    pub fn predict_hazard(
        &self,
        hazard: HazardType,
        inputs: &RawFeatureInput,
    ) -> AppResult<RiskAssessment> {
        if hazard == HazardType::Cyclone {
            return match inputs {
                RawFeatureInput::Cyclone(conditions) => {
                    conditions.validate()?;
                    let score = self.cyclone_table.score(conditions);
                    Ok(build_assessment(
                        hazard,
                        Some(score.combined),
                        score.level,
                        None,
                        Confidence::RuleBased,
                        score.contributing_factors,
                    ))
                }
                _ => Err(shared::ValidationError::new(
                    "inputs",
                    "Cyclone prediction requires latitude, longitude, pressure_hpa, wind_speed_mps and humidity_percent",
                )
                .into()),
            };
        }

        let predictor = self.models.require(hazard)?;
        let features = inputs.to_features(hazard)?;
        let estimate = predictor.estimate(&features)?;

        let (level, factors) = match hazard {
            HazardType::Tsunami => {
                let factors = match inputs {
                    RawFeatureInput::Tsunami(input) => tsunami_factors(input),
                    _ => vector_factors(features.len()),
                };
                (tsunami_event_level(estimate.probability), factors)
            }
            _ => {
                let factors = match inputs {
                    RawFeatureInput::Flood(input) => RainfallSeries::from_slice(&input.monthly_rainfall)
                        .map(|series| flood_factors(&series.seasonal_analytics()))?,
                    _ => vector_factors(features.len()),
                };
                (flood_level(estimate.probability), factors)
            }
        };

        Ok(build_assessment(
            hazard,
            Some(estimate.probability),
            level,
            None,
            estimate.confidence,
            factors,
        ))
    }
}

fn vector_factors(len: usize) -> Vec<String> {
    vec![format!("Direct feature vector ({} values)", len)]
}

/// Per-event verdicts relative to `user`.
///
/// Events whose measurements fall outside the model's input range are skipped.
pub fn evaluate_events(
    predictor: &Predictor,
    user: Coordinates,
    events: &[HazardEvent],
) -> Vec<EventRisk> {
    events
        .iter()
        .filter_map(|event| {
            let input = event_input(event);
            let estimate = tsunami_features(&input)
                .and_then(|features| predictor.estimate(&features))
                .map_err(|e| {
                    tracing::debug!(event_id = %event.id, error = %e, "Skipping event");
                })
                .ok()?;
            let distance_km = geo::distance_km(user, event.coordinates());
            Some(EventRisk {
                event: event.clone(),
                tsunami_probability: estimate.probability,
                tsunami_predicted: estimate.predicted,
                event_risk_level: tsunami_event_level(estimate.probability),
                distance_km,
                risk_zone: tsunami_user_zone(estimate.probability, estimate.predicted, distance_km),
                confidence: estimate.confidence,
            })
        })
        .collect()
}

fn event_input(event: &HazardEvent) -> TsunamiInput {
    TsunamiInput {
        magnitude: event.magnitude,
        depth: event.depth_km,
        latitude: event.latitude,
        longitude: event.longitude,
    }
}

/// Reduce per-event verdicts to the user-facing summary
pub fn summarize_user_risk(
    user: Coordinates,
    analyzed: Vec<EventRisk>,
    feed_info: FeedInfo,
) -> UserRiskAssessment {
    let mut tracker = RiskTracker::new();
    for event in &analyzed {
        tracker.observe(event.risk_zone, event);
    }

    let (highest_risk, assessment) = match tracker.into_highest() {
        Some((zone, worst)) => {
            let reasoning = tsunami_zone_reasoning(
                zone,
                worst.tsunami_probability,
                worst.tsunami_predicted,
                worst.distance_km,
            );
            let mut factors = tsunami_factors(&event_input(&worst.event));
            factors.push(reasoning.clone());
            let assessment = build_assessment(
                HazardType::Tsunami,
                Some(worst.tsunami_probability),
                zone,
                Some(worst.distance_km),
                worst.confidence,
                factors,
            );
            (
                HighestRisk {
                    risk_zone: zone,
                    risk_label: zone.label(HazardType::Tsunami).to_string(),
                    distance_km: Some(worst.distance_km),
                    reasoning,
                    earthquake: Some(worst.clone()),
                },
                assessment,
            )
        }
        None => {
            let reasoning = match feed_info.total_earthquakes_in_feed {
                0 => "No earthquakes in the selected feed".to_string(),
                total => format!(
                    "None of the {} earthquakes in the selected feed could be assessed",
                    total
                ),
            };
            (
                HighestRisk {
                    risk_zone: RiskLevel::NoRisk,
                    risk_label: RiskLevel::NoRisk.label(HazardType::Tsunami).to_string(),
                    distance_km: None,
                    reasoning: reasoning.clone(),
                    earthquake: None,
                },
                build_assessment(
                    HazardType::Tsunami,
                    None,
                    RiskLevel::NoRisk,
                    None,
                    Confidence::RuleBased,
                    vec![reasoning],
                ),
            )
        }
    };

    UserRiskAssessment {
        user_location: user,
        earthquake_count: analyzed.len(),
        overall_status: overall_status(highest_risk.risk_zone).to_string(),
        highest_risk,
        earthquakes_analyzed: analyzed,
        assessment,
        feed_info,
        timestamp: Utc::now(),
    }
}
