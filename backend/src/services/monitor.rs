//! Scheduled hazard monitor
//!
//! Each configured location runs its own task through the cycle
//! `Idle -> Fetching -> Evaluating -> (AlertDispatch | Sleeping)`. The first
//! cycle runs immediately. Cancellation interrupts sleeps only, so an
//! in-flight cycle always completes.
//!
//! An earthquake raises at most one tsunami alert per location. Alerted
//! events are restored from the alert log on first use, so a restart does
//! not alert them again.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use shared::{
    DispatchOutcome, FloodAssessment, HazardFeed, HazardType, Location, RainfallForecast,
    RiskAssessment, WeatherSnapshot,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::services::alert_composer::{compose_alert, exceeds_threshold};
use crate::services::clock::Clock;
use crate::services::{AlertDispatcher, AlertQuery, AssessmentService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Idle,
    Fetching,
    Evaluating,
    AlertDispatch,
    Sleeping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    TimerFired,
    DataFetched,
    FetchFailed,
    ThresholdExceeded,
    BelowThreshold,
    Dispatched,
    IntervalElapsed,
}

impl MonitorState {
    /// Transition table; `None` for events the state does not accept
    pub fn next(self, event: MonitorEvent) -> Option<MonitorState> {
        use MonitorEvent::*;
        use MonitorState::*;
        match (self, event) {
            (Idle, TimerFired) => Some(Fetching),
            (Fetching, DataFetched) => Some(Evaluating),
            (Fetching, FetchFailed) => Some(Sleeping),
            (Evaluating, ThresholdExceeded) => Some(AlertDispatch),
            (Evaluating, BelowThreshold) => Some(Sleeping),
            (AlertDispatch, Dispatched) => Some(Sleeping),
            (Sleeping, IntervalElapsed) => Some(Idle),
            _ => None,
        }
    }
}

/// What happened to one hazard during a cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HazardOutcome {
    /// No verdict could be produced (missing model, bad input)
    Unavailable { hazard: HazardType, reason: String },
    BelowThreshold {
        hazard: HazardType,
        probability: Option<f64>,
    },
    Alerted {
        hazard: HazardType,
        alert_id: String,
        dispatch: String,
    },
}

/// Summary of one cycle for one location
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub location: String,
    /// States visited, starting at `Idle`, or at `Sleeping` for a cycle
    /// woken by an elapsed interval
    pub states: Vec<MonitorState>,
    pub fetch_error: Option<String>,
    pub hazards: Vec<HazardOutcome>,
}

impl CycleReport {
    pub fn skipped(&self) -> bool {
        self.fetch_error.is_some()
    }

    pub fn alerts(&self) -> usize {
        self.hazards
            .iter()
            .filter(|h| matches!(h, HazardOutcome::Alerted { .. }))
            .count()
    }
}

/// Records the path through the state machine
struct Cycle {
    state: MonitorState,
    states: Vec<MonitorState>,
}

impl Cycle {
    fn start() -> Self {
        Self {
            state: MonitorState::Idle,
            states: vec![MonitorState::Idle],
        }
    }

    /// Leave `Sleeping` once the poll interval has elapsed
    fn wake(location: &str) -> Self {
        let mut cycle = Self {
            state: MonitorState::Sleeping,
            states: vec![MonitorState::Sleeping],
        };
        cycle.advance(location, MonitorEvent::IntervalElapsed);
        cycle
    }

    fn advance(&mut self, location: &str, event: MonitorEvent) {
        match self.state.next(event) {
            Some(next) => {
                tracing::debug!(location, from = ?self.state, to = ?next, "Monitor transition");
                self.state = next;
                self.states.push(next);
            }
            None => {
                tracing::error!(location, state = ?self.state, event = ?event, "Invalid monitor transition");
            }
        }
    }
}

/// Signals gathered in the fetching phase
#[derive(Default)]
struct Signals {
    weather: Option<WeatherSnapshot>,
    forecast: Option<RainfallForecast>,
    feed: Option<HazardFeed>,
}

struct Verdict {
    assessment: RiskAssessment,
    raw_signal: serde_json::Value,
    /// Earthquake behind a tsunami verdict
    event_id: Option<String>,
}

/// (location name, earthquake id)
type AlertedEvent = (String, String);

/// Earthquake id recorded in a tsunami alert's raw signal
fn alerted_event_id(raw_signal: &serde_json::Value) -> Option<String> {
    raw_signal
        .pointer("/earthquake/event/id")?
        .as_str()
        .map(str::to_string)
}

pub struct Monitor {
    assessment: AssessmentService,
    dispatcher: AlertDispatcher,
    clock: Arc<dyn Clock>,
    locations: Vec<Location>,
    /// `None` until restored from the alert log
    alerted_events: Mutex<Option<HashSet<AlertedEvent>>>,
}

impl Monitor {
    pub fn new(
        assessment: AssessmentService,
        dispatcher: AlertDispatcher,
        clock: Arc<dyn Clock>,
        locations: Vec<Location>,
    ) -> Self {
        Self {
            assessment,
            dispatcher,
            clock,
            locations,
            alerted_events: Mutex::new(None),
        }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// One cycle for every location, sequentially
    pub async fn run_once(&self) -> Vec<CycleReport> {
        tracing::info!(locations = self.locations.len(), "Starting monitoring cycle");
        let mut reports = Vec::with_capacity(self.locations.len());
        for location in &self.locations {
            reports.push(self.run_cycle(location).await);
        }
        tracing::info!("Completed monitoring cycle");
        reports
    }

    /// Spawn one task per location and wait for all of them to stop
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        tracing::info!(locations = self.locations.len(), "Hazard monitor started");

        let mut tasks = tokio::task::JoinSet::new();
        for location in self.locations.clone() {
            let monitor = Arc::clone(&self);
            let cancel = cancel.clone();
            tasks.spawn(async move { monitor.run_location(location, cancel).await });
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Monitor task panicked");
            }
        }
        tracing::info!("Hazard monitor stopped");
    }

    async fn run_location(&self, location: Location, cancel: CancellationToken) {
        let interval = location.poll_interval();
        let mut cycle = Cycle::start();
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let report = self.run_cycle_from(&location, cycle).await;
            tracing::info!(
                location = %location.name,
                skipped = report.skipped(),
                alerts = report.alerts(),
                next_in_secs = interval.as_secs(),
                "Cycle finished"
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(location = %location.name, "Monitor stopping");
                    break;
                }
                _ = self.clock.sleep(interval) => {
                    cycle = Cycle::wake(&location.name);
                }
            }
        }
    }

    /// Run a single cycle for `location`, ending in `Sleeping`
    pub async fn run_cycle(&self, location: &Location) -> CycleReport {
        self.run_cycle_from(location, Cycle::start()).await
    }

    async fn run_cycle_from(&self, location: &Location, mut cycle: Cycle) -> CycleReport {
        let name = location.name.as_str();
        tracing::info!(location = name, latitude = location.latitude, longitude = location.longitude, "Monitoring location");

        cycle.advance(name, MonitorEvent::TimerFired);
        let signals = match self.fetch(location).await {
            Ok(signals) => {
                cycle.advance(name, MonitorEvent::DataFetched);
                signals
            }
            Err(e) => {
                tracing::warn!(location = name, error = %e, "Fetch failed, skipping cycle");
                cycle.advance(name, MonitorEvent::FetchFailed);
                return CycleReport {
                    location: location.name.clone(),
                    states: cycle.states,
                    fetch_error: Some(e.to_string()),
                    hazards: vec![],
                };
            }
        };

        let mut hazards = Vec::new();
        let mut triggered = Vec::new();
        for &hazard in &location.hazards {
            match self.evaluate(location, hazard, &signals) {
                Ok(verdict) if exceeds_threshold(&verdict.assessment, location) => {
                    tracing::warn!(
                        location = name,
                        hazard = %hazard,
                        probability = verdict.assessment.probability,
                        threshold = location.alert_threshold,
                        "Alert threshold exceeded"
                    );
                    triggered.push(verdict);
                }
                Ok(verdict) => {
                    tracing::info!(
                        location = name,
                        hazard = %hazard,
                        probability = verdict.assessment.probability,
                        threshold = location.alert_threshold,
                        "Below alert threshold"
                    );
                    hazards.push(HazardOutcome::BelowThreshold {
                        hazard,
                        probability: verdict.assessment.probability,
                    });
                }
                Err(e) => {
                    tracing::warn!(location = name, hazard = %hazard, error = %e, "Hazard not evaluated");
                    hazards.push(HazardOutcome::Unavailable {
                        hazard,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if triggered.is_empty() {
            cycle.advance(name, MonitorEvent::BelowThreshold);
        } else {
            cycle.advance(name, MonitorEvent::ThresholdExceeded);
            for verdict in triggered {
                hazards.push(self.dispatch(location, verdict, signals.weather.as_ref()).await);
            }
            cycle.advance(name, MonitorEvent::Dispatched);
        }

        CycleReport {
            location: location.name.clone(),
            states: cycle.states,
            fetch_error: None,
            hazards,
        }
    }

    /// Current weather and hazard feeds are required; the rainfall
    /// forecast is optional
    async fn fetch(&self, location: &Location) -> AppResult<Signals> {
        let (lat, lon) = (location.latitude, location.longitude);
        let mut signals = Signals::default();

        let needs_weather = location
            .hazards
            .iter()
            .any(|h| matches!(h, HazardType::Flood | HazardType::Cyclone));
        if needs_weather {
            signals.weather = Some(self.assessment.weather().fetch_current(lat, lon).await?);
        }
        if location.hazards.contains(&HazardType::Flood) {
            signals.forecast = self.assessment.fetch_forecast_or_baseline(lat, lon).await;
        }
        if location.hazards.contains(&HazardType::Tsunami) {
            let mut feed = self
                .assessment
                .hazards()
                .fetch_hazard_events(location.feed)
                .await?;
            let alerted = self.alerted_event_ids(&location.name).await;
            let before = feed.events.len();
            feed.events.retain(|event| !alerted.contains(&event.id));
            if feed.events.len() < before {
                tracing::debug!(
                    location = %location.name,
                    skipped = before - feed.events.len(),
                    "Ignoring earthquakes already alerted"
                );
            }
            signals.feed = Some(feed);
        }
        Ok(signals)
    }

    /// Earthquakes that already raised a tsunami alert for `location`
    async fn alerted_event_ids(&self, location: &str) -> HashSet<String> {
        let mut alerted = self.alerted_events.lock().await;
        if alerted.is_none() {
            match self.restore_alerted_events().await {
                Ok(restored) => {
                    tracing::info!(events = restored.len(), "Restored alerted earthquakes");
                    *alerted = Some(restored);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Alert history unavailable");
                }
            }
        }
        alerted
            .iter()
            .flatten()
            .filter(|(name, _)| name == location)
            .map(|(_, id)| id.clone())
            .collect()
    }

    async fn restore_alerted_events(&self) -> AppResult<HashSet<AlertedEvent>> {
        let alerts = self.dispatcher.log().query(&AlertQuery::default()).await?;
        Ok(alerts
            .iter()
            .filter(|alert| alert.assessment.hazard_type == HazardType::Tsunami)
            .filter_map(|alert| {
                let id = alerted_event_id(&alert.raw_signal)?;
                Some((alert.location.name.clone(), id))
            })
            .collect())
    }

    async fn remember_event(&self, location: &str, event_id: String) {
        self.alerted_events
            .lock()
            .await
            .get_or_insert_with(HashSet::new)
            .insert((location.to_string(), event_id));
    }

    fn evaluate(&self, location: &Location, hazard: HazardType, signals: &Signals) -> AppResult<Verdict> {
        let (lat, lon) = (location.latitude, location.longitude);
        match hazard {
            HazardType::Flood => {
                let flood: FloodAssessment = self.assessment.flood_from_forecast(
                    lat,
                    lon,
                    None,
                    signals.forecast.as_ref(),
                    self.clock.now(),
                )?;
                Ok(Verdict {
                    raw_signal: serde_json::json!({
                        "weather": signals.weather,
                        "year": flood.year,
                        "rainfall_mm": flood.rainfall,
                        "forecast_applied": flood.forecast_applied,
                    }),
                    assessment: flood.assessment,
                    event_id: None,
                })
            }
            HazardType::Cyclone => {
                let weather = signals.weather.clone().ok_or_else(|| {
                    shared::ValidationError::new("weather", "No weather data fetched")
                })?;
                let source = self.assessment.weather().name().to_string();
                let cyclone = self.assessment.cyclone_from_weather(lat, lon, weather, source)?;
                Ok(Verdict {
                    raw_signal: serde_json::json!({
                        "weather": cyclone.weather_data,
                        "prediction": cyclone.cyclone_prediction,
                    }),
                    assessment: cyclone.assessment,
                    event_id: None,
                })
            }
            HazardType::Tsunami => {
                let feed = signals.feed.as_ref().ok_or_else(|| {
                    shared::ValidationError::new("feed", "No earthquake feed fetched")
                })?;
                let user = self
                    .assessment
                    .tsunami_from_feed(location.coordinates(), feed)?;
                Ok(Verdict {
                    event_id: user.highest_risk.earthquake.as_ref().map(|e| e.event.id.clone()),
                    raw_signal: serde_json::json!({
                        "earthquake": user.highest_risk.earthquake,
                        "feed": user.feed_info,
                    }),
                    assessment: user.assessment,
                })
            }
        }
    }

    async fn dispatch(
        &self,
        location: &Location,
        verdict: Verdict,
        weather: Option<&WeatherSnapshot>,
    ) -> HazardOutcome {
        let Verdict {
            assessment,
            raw_signal,
            event_id,
        } = verdict;
        let hazard = assessment.hazard_type;
        let mut alert = compose_alert(location, assessment, raw_signal, weather, self.clock.now());

        let dispatch = match self.dispatcher.dispatch(&mut alert).await {
            Ok(outcome) => {
                if let Some(event_id) = event_id {
                    self.remember_event(&location.name, event_id).await;
                }
                match outcome {
                    DispatchOutcome::Delivered => "delivered".to_string(),
                    DispatchOutcome::Duplicate => "duplicate".to_string(),
                    DispatchOutcome::Failed(reason) => format!("dispatch_failed: {}", reason),
                }
            }
            Err(e) => {
                tracing::error!(alert_id = %alert.alert_id, error = %e, "Alert could not be logged");
                format!("log_failed: {}", e)
            }
        };

        HazardOutcome::Alerted {
            hazard,
            alert_id: alert.alert_id,
            dispatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MonitorEvent::*;
    use MonitorState::*;

    #[test]
    fn test_transition_table() {
        assert_eq!(Idle.next(TimerFired), Some(Fetching));
        assert_eq!(Fetching.next(FetchFailed), Some(Sleeping));
        assert_eq!(Evaluating.next(ThresholdExceeded), Some(AlertDispatch));
        assert_eq!(Evaluating.next(BelowThreshold), Some(Sleeping));
        assert_eq!(AlertDispatch.next(Dispatched), Some(Sleeping));
        assert_eq!(Sleeping.next(IntervalElapsed), Some(Idle));
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        assert_eq!(Idle.next(DataFetched), None);
        assert_eq!(Sleeping.next(TimerFired), None);
        assert_eq!(Fetching.next(ThresholdExceeded), None);
    }

    #[test]
    fn test_wake_records_interval_elapsed() {
        let cycle = Cycle::wake("Mumbai, India");
        assert_eq!(cycle.state, Idle);
        assert_eq!(cycle.states, vec![Sleeping, Idle]);
    }

    #[test]
    fn test_alerted_event_id_from_raw_signal() {
        let raw = serde_json::json!({"earthquake": {"event": {"id": "us7000abcd"}}, "feed": {}});
        assert_eq!(alerted_event_id(&raw).as_deref(), Some("us7000abcd"));
        assert_eq!(alerted_event_id(&serde_json::json!({"earthquake": null})), None);
    }

    #[test]
    fn test_every_path_ends_sleeping() {
        let paths: [&[MonitorEvent]; 3] = [
            &[TimerFired, FetchFailed],
            &[TimerFired, DataFetched, BelowThreshold],
            &[TimerFired, DataFetched, ThresholdExceeded, Dispatched],
        ];
        for path in paths {
            let end = path
                .iter()
                .try_fold(Idle, |state, event| state.next(*event));
            assert_eq!(end, Some(Sleeping));
        }
    }
}
