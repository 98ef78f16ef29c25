//! WaveGuard hazard risk platform - backend
//!
//! Shared wiring for the HTTP server and the standalone monitor: application
//! state, router construction, tracing setup and service assembly from
//! configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

use config::{AlertLogBackend, WeatherProvider};
use external::{HazardSource, OpenWeatherClient, SimulatedWeather, UsgsClient, WeatherSource};
use services::{
    AlertDispatcher, AlertLog, AlertSink, AssessmentService, Clock, JsonFileAlertLog, LogSink,
    ModelRegistry, Monitor, PgAlertLog, WebhookSink,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub assessment: AssessmentService,
    pub alert_log: Arc<dyn AlertLog>,
}

/// Initialize tracing; `log_format = "json"` switches to JSON lines
pub fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "waveguard=debug,tower_http=debug,sqlx=warn".into());

    let (pretty, json) = if log_format.eq_ignore_ascii_case("json") {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "WaveGuard Hazard Risk API v1.0"
}

// ============================================================================
// Service assembly
// ============================================================================

/// Everything the server and the monitor need, built from configuration
pub struct Services {
    pub assessment: AssessmentService,
    pub dispatcher: AlertDispatcher,
    pub db: Option<PgPool>,
}

impl Services {
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let db = match &config.database.url {
            Some(url) => {
                tracing::info!("Connecting to database...");
                let pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .min_connections(config.database.min_connections)
                    .acquire_timeout(Duration::from_secs(30))
                    .connect(url)
                    .await?;
                tracing::info!("Database connection established");

                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Migrations completed");
                Some(pool)
            }
            None => None,
        };

        let models = Arc::new(ModelRegistry::load_dir(&config.models.directory)?);
        if models.is_empty() {
            tracing::warn!(
                directory = %config.models.directory.display(),
                "No hazard models loaded; only cyclone assessment is available"
            );
        }

        let timeout = config.monitor.fetch_timeout();
        let hazards: Arc<dyn HazardSource> =
            Arc::new(UsgsClient::new(config.usgs.base_url.clone(), timeout)?);
        let simulated: Arc<dyn WeatherSource> =
            Arc::new(SimulatedWeather::new(config.weather.simulation_seed));
        let weather: Arc<dyn WeatherSource> = match config.weather.provider {
            WeatherProvider::Live => {
                let api_key = config.weather.api_key.clone().ok_or_else(|| {
                    anyhow::anyhow!("weather.api_key is required for the live provider")
                })?;
                Arc::new(OpenWeatherClient::with_base_url(
                    api_key,
                    config.weather.base_url.clone(),
                    timeout,
                )?)
            }
            WeatherProvider::Simulated => Arc::clone(&simulated),
        };
        tracing::info!(weather = weather.name(), "Weather source configured");

        let assessment = AssessmentService::new(
            models,
            hazards,
            weather,
            simulated,
            config.cyclone.clone(),
            config.weather.forecast_days,
        );

        let log: Arc<dyn AlertLog> = match (config.alerts.backend, &db) {
            (AlertLogBackend::Postgres, Some(pool)) => Arc::new(PgAlertLog::new(pool.clone())),
            (AlertLogBackend::Postgres, None) => {
                anyhow::bail!("alerts.backend = postgres requires database.url")
            }
            (AlertLogBackend::File, _) => {
                Arc::new(JsonFileAlertLog::open(&config.alerts.log_path).await?)
            }
        };
        let sink: Arc<dyn AlertSink> = match &config.alerts.webhook_url {
            Some(url) => Arc::new(WebhookSink::new(url.clone(), config.alerts.webhook_secret.clone())?),
            None => {
                tracing::info!("No webhook configured, alerts are logged only");
                Arc::new(LogSink)
            }
        };

        Ok(Self {
            assessment,
            dispatcher: AlertDispatcher::new(log, sink),
            db,
        })
    }

    pub fn app_state(&self, config: Arc<Config>) -> AppState {
        AppState {
            config,
            assessment: self.assessment.clone(),
            alert_log: Arc::clone(self.dispatcher.log()),
        }
    }

    pub fn monitor(&self, config: &Config, clock: Arc<dyn Clock>) -> Monitor {
        Monitor::new(
            self.assessment.clone(),
            self.dispatcher.clone(),
            clock,
            config.monitor.locations.clone(),
        )
    }
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
