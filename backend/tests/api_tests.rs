//! HTTP API integration tests
//!
//! Exercises the router end to end with `tower::ServiceExt::oneshot`.

mod common;

use std::io::Write;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use common::*;
use serde_json::{json, Value};
use shared::{HazardType, Location};
use tower::ServiceExt;
use waveguard::services::alert_composer::compose_alert;
use waveguard::services::assessment::build_assessment;
use waveguard::services::{AlertLog, JsonFileAlertLog, ModelRegistry};
use waveguard::{create_app, AppState, Config};

struct TestApp {
    router: Router,
    log: Arc<JsonFileAlertLog>,
    _dir: tempfile::TempDir,
}

async fn app(models: ModelRegistry, weather: StubWeather) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("waveguard.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    file.write_all(b"[weather]\nprovider = \"simulated\"\n").unwrap();
    let config = Config::load_from(Some(config_path.as_path())).unwrap();

    let log = Arc::new(JsonFileAlertLog::open(dir.path().join("alerts.jsonl")).await.unwrap());
    let feed = vec![
        quake("us7000abcd", 7.4, 38.3, 142.4),
        quake("us7000abcd", 7.4, 38.3, 142.4),
        quake("us7000efgh", 5.1, -6.2, 130.1),
    ];
    let state = AppState {
        config: Arc::new(config),
        assessment: assessment_service(models, feed, Arc::new(weather)),
        alert_log: log.clone(),
    };

    TestApp {
        router: create_app(state),
        log,
        _dir: dir,
    }
}

fn flood_only() -> ModelRegistry {
    ModelRegistry::new().with_model(HazardType::Flood, constant(HazardType::Flood, 0.91))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_loaded_models() {
    let app = app(flood_only(), StubWeather::fixed(calm_weather())).await;
    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["models_loaded"], 1);
    assert_eq!(body["available_models"], json!(["flood"]));

    let (status, body) = send(&app.router, get("/api/v1/models")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_loaded"], 1);
}

#[tokio::test]
async fn test_health_degraded_without_models() {
    let app = app(ModelRegistry::new(), StubWeather::fixed(calm_weather())).await;
    let (_, body) = send(&app.router, get("/api/v1/health")).await;
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_flood_risk_assessment() {
    let app = app(flood_only(), StubWeather::fixed(calm_weather())).await;
    let (status, body) = send(
        &app.router,
        post(
            "/api/v1/assess/flood-risk",
            json!({"latitude": 19.076, "longitude": 72.8777, "year": 2024}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["year"], 2024);
    assert_eq!(body["forecast_applied"], true);
    assert_eq!(body["assessment"]["hazard_type"], "flood");
    assert_eq!(body["assessment"]["probability"], 0.91);
    assert!(!body["assessment"]["recommendations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_flood_risk_survives_forecast_outage() {
    let app = app(flood_only(), StubWeather::failing()).await;
    let (status, body) = send(
        &app.router,
        post("/api/v1/assess/flood-risk", json!({"latitude": 45.44, "longitude": 12.31})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forecast_applied"], false);
    assert_eq!(body["data_source"], "climatological baseline");
}

#[tokio::test]
async fn test_invalid_coordinates_rejected() {
    let app = app(flood_only(), StubWeather::fixed(calm_weather())).await;
    let (status, body) = send(
        &app.router,
        post("/api/v1/assess/flood-risk", json!({"latitude": 95.0, "longitude": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "latitude");
}

#[tokio::test]
async fn test_missing_model_is_service_unavailable() {
    let app = app(flood_only(), StubWeather::fixed(calm_weather())).await;
    let (status, body) = send(
        &app.router,
        post("/api/v1/assess/tsunami-risk", json!({"latitude": 35.68, "longitude": 139.65})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "MODEL_UNAVAILABLE");
}

#[tokio::test]
async fn test_tsunami_risk_picks_worst_event() {
    let models = ModelRegistry::new()
        .with_model(HazardType::Tsunami, constant(HazardType::Tsunami, 0.85));
    let app = app(models, StubWeather::fixed(calm_weather())).await;
    let (status, body) = send(
        &app.router,
        post(
            "/api/v1/assess/tsunami-risk",
            json!({"latitude": 38.0, "longitude": 141.5, "feed_type": "past_day_m45"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // duplicate ids in the feed count once
    assert_eq!(body["feed_info"]["total_earthquakes_in_feed"], 2);
    assert_eq!(body["highest_risk"]["earthquake"]["event"]["id"], "us7000abcd");
    assert_eq!(body["assessment"]["risk_level"], "high");
}

#[tokio::test]
async fn test_cyclone_risk_uses_rule_table() {
    let app = app(ModelRegistry::new(), StubWeather::fixed(calm_weather())).await;
    let (status, body) = send(
        &app.router,
        post("/api/v1/assess/cyclone-risk", json!({"latitude": 15.0, "longitude": 88.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessment"]["hazard_type"], "cyclone");
    assert_eq!(body["assessment"]["confidence"], "rule_based");
}

#[tokio::test]
async fn test_predict_with_raw_features() {
    let app = app(flood_only(), StubWeather::fixed(calm_weather())).await;
    let (status, body) = send(
        &app.router,
        post(
            "/api/v1/predict/flood",
            json!({"year": 2023, "monthly_rainfall": [10, 12, 20, 45, 120, 480, 900, 760, 410, 180, 60, 15]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["probability"], 0.91);

    let (status, _) = send(
        &app.router,
        post("/api/v1/predict/flood", json!({"year": 2023, "monthly_rainfall": [10, 12]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, post("/api/v1/predict/volcano", json!({"features": [1.0]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_earthquake_feed_passthrough() {
    let app = app(flood_only(), StubWeather::fixed(calm_weather())).await;
    let (status, body) = send(&app.router, get("/api/v1/earthquakes/past_week_m45")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feed_type"], "past_week_m45");
    assert_eq!(body["events"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app.router, get("/api/v1/earthquakes/past_century")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_alert_history_query() {
    let app = app(flood_only(), StubWeather::fixed(calm_weather())).await;
    let assessment = build_assessment(
        HazardType::Flood,
        Some(0.8),
        shared::RiskLevel::High,
        None,
        shared::Confidence::Calibrated,
        vec![],
    );
    for name in ["Mumbai, India", "Venice, Italy"] {
        let location = Location::new(name, 19.0, 72.8);
        let alert = compose_alert(&location, assessment.clone(), json!({}), None, start_time());
        assert!(app.log.append(&alert).await.unwrap());
    }

    let (status, body) = send(&app.router, get("/api/v1/alerts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app.router, get("/api/v1/alerts?location=Venice%2C%20Italy")).await;
    let alerts = body.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["alert_id"], "FLOOD_Venice_Italy_20240714_090503");

    let (_, body) = send(&app.router, get("/api/v1/alerts?from=2024-07-15T00:00:00Z")).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app.router,
        get("/api/v1/alerts?from=2024-07-15T00:00:00Z&to=2024-07-14T00:00:00Z"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
