//! Alert dispatch: log first, then deliver
//!
//! Delivery failures are recorded against the logged alert and reported as
//! [`DispatchOutcome::Failed`]; they are never raised to the caller and
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use shared::{Alert, DispatchOutcome};

use crate::error::{AppError, AppResult};
use crate::services::alert_log::AlertLog;

pub const SIGNATURE_HEADER: &str = "X-WaveGuard-Signature";
pub const USER_AGENT: &str = "WaveGuard-Monitor/1.0";
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Destination for dispatched alerts
#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, alert: &Alert) -> AppResult<()>;
}

/// Writes the alert to the process log only
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, alert: &Alert) -> AppResult<()> {
        tracing::warn!(
            alert_id = %alert.alert_id,
            location = %alert.location.name,
            hazard = %alert.assessment.hazard_type,
            risk_level = %alert.assessment.risk_label,
            "{}",
            alert.message
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookLocation<'a> {
    name: &'a str,
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    alert_id: &'a str,
    alert_type: &'a str,
    location: WebhookLocation<'a>,
    probability: Option<f64>,
    risk_level: &'a str,
    severity: String,
    message: &'a str,
    timestamp: String,
    signal: &'a serde_json::Value,
    recommendations: &'a [String],
}

impl<'a> WebhookPayload<'a> {
    fn from_alert(alert: &'a Alert) -> Self {
        Self {
            alert_id: &alert.alert_id,
            alert_type: alert.assessment.hazard_type.as_str(),
            location: WebhookLocation {
                name: &alert.location.name,
                latitude: alert.location.latitude,
                longitude: alert.location.longitude,
            },
            probability: alert.assessment.probability,
            risk_level: &alert.assessment.risk_label,
            severity: alert.assessment.risk_label.to_ascii_lowercase(),
            message: &alert.message,
            timestamp: alert.created_at.to_rfc3339(),
            signal: &alert.raw_signal,
            recommendations: &alert.assessment.recommendations,
        }
    }
}

/// JSON POST to a configured endpoint
pub struct WebhookSink {
    client: Client,
    url: String,
    secret: Option<String>,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, secret: Option<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            secret,
        })
    }
}

/// Base64 HMAC-SHA256 of `body` under `secret`
pub fn sign(secret: &str, body: &[u8]) -> AppResult<String> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Configuration("Failed to create HMAC".to_string()))?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, alert: &Alert) -> AppResult<()> {
        let body = serde_json::to_vec(&WebhookPayload::from_alert(alert))
            .map_err(|e| AppError::Dispatch(format!("Failed to encode alert: {}", e)))?;

        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, sign(secret, &body)?);
        }

        let response = request.body(body).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Dispatch("webhook timed out".to_string())
            } else {
                AppError::Dispatch(format!("webhook request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(AppError::Dispatch(format!(
                "webhook returned HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

#[derive(Clone)]
pub struct AlertDispatcher {
    log: Arc<dyn AlertLog>,
    sink: Arc<dyn AlertSink>,
}

impl AlertDispatcher {
    pub fn new(log: Arc<dyn AlertLog>, sink: Arc<dyn AlertSink>) -> Self {
        Self { log, sink }
    }

    pub fn log(&self) -> &Arc<dyn AlertLog> {
        &self.log
    }

    /// Log `alert`, then try the sink once.
    ///
    /// Errors only when the alert cannot be logged.
    pub async fn dispatch(&self, alert: &mut Alert) -> AppResult<DispatchOutcome> {
        if !self.log.append(alert).await? {
            tracing::info!(alert_id = %alert.alert_id, "Alert already logged, not resending");
            return Ok(DispatchOutcome::Duplicate);
        }

        let outcome = match self.sink.deliver(alert).await {
            Ok(()) => {
                alert.mark_delivered();
                tracing::info!(alert_id = %alert.alert_id, sink = self.sink.name(), "Alert delivered");
                DispatchOutcome::Delivered
            }
            Err(e) => {
                let reason = e.to_string();
                alert.mark_failed(reason.clone());
                tracing::warn!(
                    alert_id = %alert.alert_id,
                    sink = self.sink.name(),
                    error = %e,
                    "Alert delivery failed"
                );
                DispatchOutcome::Failed(reason)
            }
        };

        if let Err(e) = self
            .log
            .record_status(&alert.alert_id, alert.dispatch_status, alert.dispatch_error.as_deref())
            .await
        {
            tracing::error!(alert_id = %alert.alert_id, error = %e, "Failed to record dispatch status");
        }

        Ok(outcome)
    }
}
