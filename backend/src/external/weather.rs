//! Weather data sources
//!
//! `OpenWeatherClient` talks to OpenWeatherMap (current conditions and the
//! 5-day/3-hour forecast). `SimulatedWeather` produces seeded random
//! conditions for demos and tests when no API key is available.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use serde::Deserialize;
use shared::{RainfallForecast, WeatherSnapshot};

use crate::error::{AppError, AppResult};

const SERVICE: &str = "OpenWeatherMap";

/// Source of current conditions and short-range rainfall forecasts
#[async_trait]
pub trait WeatherSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_current(&self, latitude: f64, longitude: f64) -> AppResult<WeatherSnapshot>;

    /// Daily rainfall totals for the next `days` days
    async fn fetch_forecast_rainfall(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
    ) -> AppResult<RainfallForecast>;
}

/// OpenWeatherMap API client
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    weather: Vec<OWMWeather>,
    main: OWMMain,
    visibility: Option<f64>,
    wind: OWMWind,
    clouds: Option<OWMClouds>,
    rain: Option<OWMRain>,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OWMWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OWMClouds {
    all: f64,
}

#[derive(Debug, Deserialize)]
struct OWMRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

/// OpenWeatherMap API response for forecast
#[derive(Debug, Deserialize)]
struct OWMForecastResponse {
    list: Vec<OWMForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OWMForecastItem {
    dt: i64,
    rain: Option<OWMRain>,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, timeout: Duration) -> AppResult<Self> {
        Self::with_base_url(
            api_key,
            "https://api.openweathermap.org/data/2.5".to_string(),
            timeout,
        )
    }

    /// Create a client against a custom base URL (for testing)
    pub fn with_base_url(api_key: String, base_url: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> AppResult<T> {
        let response = self
            .client
            .get(url)
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| request_error(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                SERVICE,
                format!("HTTP {} - {}", status, body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::upstream(SERVICE, format!("Failed to parse response: {}", e)))
    }
}

/// Map a reqwest failure, naming timeouts explicitly
pub(crate) fn request_error(service: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::upstream(service, "request timed out")
    } else {
        AppError::upstream(service, format!("request failed: {}", err))
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn fetch_current(&self, latitude: f64, longitude: f64) -> AppResult<WeatherSnapshot> {
        let url = format!(
            "{}/weather?lat={}&lon={}",
            self.base_url, latitude, longitude
        );
        let data: OWMCurrentResponse = self.get(&url).await?;
        Ok(convert_current_response(data))
    }

    async fn fetch_forecast_rainfall(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
    ) -> AppResult<RainfallForecast> {
        let url = format!(
            "{}/forecast?lat={}&lon={}",
            self.base_url, latitude, longitude
        );
        let data: OWMForecastResponse = self.get(&url).await?;
        Ok(daily_rainfall(&data.list, days))
    }
}

fn convert_current_response(data: OWMCurrentResponse) -> WeatherSnapshot {
    let precipitation_mm = data
        .rain
        .as_ref()
        .and_then(|r| r.one_hour.or(r.three_hour))
        .unwrap_or(0.0);

    WeatherSnapshot {
        temperature_celsius: data.main.temp,
        humidity_percent: data.main.humidity,
        pressure_hpa: data.main.pressure,
        wind_speed_mps: data.wind.speed,
        wind_direction_deg: data.wind.deg.unwrap_or(0.0),
        // reported in metres
        visibility_km: data.visibility.unwrap_or(10_000.0) / 1000.0,
        precipitation_mm,
        clouds_percent: data.clouds.map(|c| c.all).unwrap_or(0.0),
        description: data
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_default(),
        observed_at: DateTime::from_timestamp(data.dt, 0).unwrap_or_else(Utc::now),
    }
}

/// Sum 3-hour rain buckets per UTC day, keeping the first `days` days
fn daily_rainfall(items: &[OWMForecastItem], days: u32) -> RainfallForecast {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for item in items {
        let Some(at) = DateTime::from_timestamp(item.dt, 0) else {
            continue;
        };
        let rain = item
            .rain
            .as_ref()
            .and_then(|r| r.three_hour)
            .unwrap_or(0.0);
        *per_day.entry(at.date_naive()).or_insert(0.0) += rain;
    }

    RainfallForecast {
        daily_totals_mm: per_day.into_values().take(days as usize).collect(),
    }
}

// ============================================================================
// Simulated source
// ============================================================================

/// Seeded random weather, reproducible for a given seed
pub struct SimulatedWeather {
    rng: Mutex<StdRng>,
}

impl SimulatedWeather {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[async_trait]
impl WeatherSource for SimulatedWeather {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn fetch_current(&self, latitude: f64, longitude: f64) -> AppResult<WeatherSnapshot> {
        tracing::debug!(latitude, longitude, "Generating simulated weather");
        Ok(self.with_rng(|rng| WeatherSnapshot {
            temperature_celsius: round1(rng.random_range(25.0..35.0)),
            humidity_percent: round1(rng.random_range(60.0..90.0)),
            pressure_hpa: round1(rng.random_range(993.0..1033.0)),
            wind_speed_mps: round1(rng.random_range(0.0..30.0)),
            wind_direction_deg: round1(rng.random_range(0.0..360.0)),
            visibility_km: round1(rng.random_range(10.0..25.0)),
            precipitation_mm: round1(rng.random_range(0.0..5.0)),
            clouds_percent: round1(rng.random_range(0.0..100.0)),
            description: "simulated conditions".to_string(),
            observed_at: Utc::now(),
        }))
    }

    async fn fetch_forecast_rainfall(
        &self,
        _latitude: f64,
        _longitude: f64,
        days: u32,
    ) -> AppResult<RainfallForecast> {
        Ok(self.with_rng(|rng| RainfallForecast {
            daily_totals_mm: (0..days).map(|_| round1(rng.random_range(0.0..20.0))).collect(),
        }))
    }
}
