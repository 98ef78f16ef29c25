//! Append-only alert log
//!
//! Alerts are keyed by `alert_id`; appending an id that is already present
//! is a no-op. Dispatch results are recorded after the alert itself, so a
//! failed delivery never removes an alert from the log.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use shared::{Alert, DispatchStatus, TimeRange};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Filter for alert log queries
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    /// Exact location name, case-insensitive
    pub location: Option<String>,
    pub range: TimeRange,
    pub limit: Option<usize>,
}

impl AlertQuery {
    fn matches(&self, alert: &Alert) -> bool {
        self.location
            .as_deref()
            .map_or(true, |name| alert.location.name.eq_ignore_ascii_case(name))
            && self.range.contains(alert.created_at)
    }
}

#[async_trait]
pub trait AlertLog: Send + Sync {
    /// Record a new alert; returns `false` if the id was already logged
    async fn append(&self, alert: &Alert) -> AppResult<bool>;

    async fn record_status(
        &self,
        alert_id: &str,
        status: DispatchStatus,
        error: Option<&str>,
    ) -> AppResult<()>;

    async fn query(&self, query: &AlertQuery) -> AppResult<Vec<Alert>>;
}

// ============================================================================
// JSON lines file
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum LogRecord {
    Alert {
        alert: Alert,
    },
    Status {
        alert_id: String,
        status: DispatchStatus,
        error: Option<String>,
        at: DateTime<Utc>,
    },
}

/// One JSON record per line; status changes are appended, never rewritten
pub struct JsonFileAlertLog {
    path: PathBuf,
    /// Logged alert ids; the lock also serialises file writes
    known: Mutex<HashSet<String>>,
}

impl JsonFileAlertLog {
    /// Open (or lazily create) the log at `path`
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let known = read_records(&path)
            .await?
            .into_iter()
            .filter_map(|record| match record {
                LogRecord::Alert { alert } => Some(alert.alert_id),
                LogRecord::Status { .. } => None,
            })
            .collect::<HashSet<_>>();

        tracing::info!(path = %path.display(), alerts = known.len(), "Opened alert log");
        Ok(Self {
            path,
            known: Mutex::new(known),
        })
    }

    async fn write_line(&self, record: &LogRecord) -> AppResult<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| AppError::Internal(format!("Failed to encode alert record: {}", e)))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| io_error(&self.path, e))?;
        file.flush().await.map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }
}

fn io_error(path: &Path, err: std::io::Error) -> AppError {
    AppError::Internal(format!("Alert log {}: {}", path.display(), err))
}

async fn read_records(path: &Path) -> AppResult<Vec<LogRecord>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(path, e)),
    };

    Ok(contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), line = idx + 1, error = %e, "Skipping malformed alert record");
                None
            }
        })
        .collect())
}

/// Replay records into alerts, in log order, with their latest status
fn replay(records: Vec<LogRecord>) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        match record {
            LogRecord::Alert { alert } => {
                if !index.contains_key(&alert.alert_id) {
                    index.insert(alert.alert_id.clone(), alerts.len());
                    alerts.push(alert);
                }
            }
            LogRecord::Status {
                alert_id,
                status,
                error,
                ..
            } => {
                if let Some(alert) = index.get(&alert_id).and_then(|&i| alerts.get_mut(i)) {
                    match status {
                        DispatchStatus::Delivered => alert.mark_delivered(),
                        DispatchStatus::DispatchFailed => {
                            alert.mark_failed(error.unwrap_or_default())
                        }
                        DispatchStatus::Pending => alert.dispatch_status = DispatchStatus::Pending,
                    }
                }
            }
        }
    }
    alerts
}

#[async_trait]
impl AlertLog for JsonFileAlertLog {
    async fn append(&self, alert: &Alert) -> AppResult<bool> {
        let mut known = self.known.lock().await;
        if known.contains(&alert.alert_id) {
            return Ok(false);
        }
        self.write_line(&LogRecord::Alert {
            alert: alert.clone(),
        })
        .await?;
        known.insert(alert.alert_id.clone());
        Ok(true)
    }

    async fn record_status(
        &self,
        alert_id: &str,
        status: DispatchStatus,
        error: Option<&str>,
    ) -> AppResult<()> {
        let _guard = self.known.lock().await;
        self.write_line(&LogRecord::Status {
            alert_id: alert_id.to_string(),
            status,
            error: error.map(str::to_string),
            at: Utc::now(),
        })
        .await
    }

    async fn query(&self, query: &AlertQuery) -> AppResult<Vec<Alert>> {
        let records = {
            let _guard = self.known.lock().await;
            read_records(&self.path).await?
        };
        Ok(replay(records)
            .into_iter()
            .filter(|alert| query.matches(alert))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }
}

// ============================================================================
// PostgreSQL
// ============================================================================

#[derive(Clone)]
pub struct PgAlertLog {
    db: PgPool,
}

#[derive(FromRow)]
struct AlertRow {
    payload: sqlx::types::Json<Alert>,
    dispatch_status: String,
    dispatch_error: Option<String>,
}

impl PgAlertLog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlertLog for PgAlertLog {
    async fn append(&self, alert: &Alert) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO alert_log (
                alert_id, location_name, hazard_type, probability,
                risk_level, dispatch_status, payload, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (alert_id) DO NOTHING
            "#,
        )
        .bind(&alert.alert_id)
        .bind(&alert.location.name)
        .bind(alert.assessment.hazard_type.as_str())
        .bind(alert.assessment.probability)
        .bind(&alert.assessment.risk_label)
        .bind(alert.dispatch_status.as_str())
        .bind(sqlx::types::Json(alert))
        .bind(alert.created_at)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_status(
        &self,
        alert_id: &str,
        status: DispatchStatus,
        error: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE alert_log
            SET dispatch_status = $2, dispatch_error = $3, updated_at = NOW()
            WHERE alert_id = $1
            "#,
        )
        .bind(alert_id)
        .bind(status.as_str())
        .bind(error)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn query(&self, query: &AlertQuery) -> AppResult<Vec<Alert>> {
        let limit = query
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT payload, dispatch_status, dispatch_error
            FROM alert_log
            WHERE ($1::TEXT IS NULL OR LOWER(location_name) = LOWER($1))
              AND ($2::TIMESTAMPTZ IS NULL OR created_at >= $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at < $3)
            ORDER BY created_at, alert_id
            LIMIT $4
            "#,
        )
        .bind(query.location.as_deref())
        .bind(query.range.from)
        .bind(query.range.to)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut alert = row.payload.0;
                match row.dispatch_status.parse::<DispatchStatus>() {
                    Ok(DispatchStatus::Delivered) => alert.mark_delivered(),
                    Ok(DispatchStatus::DispatchFailed) => {
                        alert.mark_failed(row.dispatch_error.unwrap_or_default())
                    }
                    Ok(DispatchStatus::Pending) => {}
                    Err(e) => tracing::warn!(alert_id = %alert.alert_id, error = %e, "Bad status column"),
                }
                alert
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::alert_composer::compose_alert;
    use crate::services::assessment::build_assessment;
    use chrono::TimeZone;
    use shared::{Confidence, HazardType, Location, RiskLevel};

    fn alert(name: &str, hour: u32) -> Alert {
        let at = Utc.with_ymd_and_hms(2024, 7, 14, hour, 0, 0).unwrap();
        let assessment = build_assessment(
            HazardType::Flood,
            Some(0.9),
            RiskLevel::Extreme,
            None,
            Confidence::Calibrated,
            vec![],
        );
        compose_alert(&Location::new(name, 10.0, 10.0), assessment, serde_json::json!({}), None, at)
    }

    #[tokio::test]
    async fn test_append_is_idempotent_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.jsonl");

        let log = JsonFileAlertLog::open(&path).await.unwrap();
        let first = alert("Venice, Italy", 8);
        assert!(log.append(&first).await.unwrap());
        assert!(!log.append(&first).await.unwrap());

        let reopened = JsonFileAlertLog::open(&path).await.unwrap();
        assert!(!reopened.append(&first).await.unwrap());
        assert_eq!(reopened.query(&AlertQuery::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_status_replay_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonFileAlertLog::open(dir.path().join("alerts.jsonl")).await.unwrap();

        let venice = alert("Venice, Italy", 8);
        let mumbai = alert("Mumbai, India", 12);
        log.append(&venice).await.unwrap();
        log.append(&mumbai).await.unwrap();
        log.record_status(&venice.alert_id, DispatchStatus::DispatchFailed, Some("HTTP 500"))
            .await
            .unwrap();
        log.record_status(&mumbai.alert_id, DispatchStatus::Delivered, None)
            .await
            .unwrap();

        let query = AlertQuery {
            location: Some("venice, italy".to_string()),
            ..Default::default()
        };
        let found = log.query(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dispatch_status, DispatchStatus::DispatchFailed);
        assert_eq!(found[0].dispatch_error.as_deref(), Some("HTTP 500"));

        let query = AlertQuery {
            range: TimeRange {
                from: Some(Utc.with_ymd_and_hms(2024, 7, 14, 10, 0, 0).unwrap()),
                to: None,
            },
            ..Default::default()
        };
        let found = log.query(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].dispatched);
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.jsonl");
        let good = serde_json::to_string(&LogRecord::Alert {
            alert: alert("Houston, TX", 1),
        })
        .unwrap();
        tokio::fs::write(&path, format!("{{not json\n{}\n", good)).await.unwrap();

        let log = JsonFileAlertLog::open(&path).await.unwrap();
        assert_eq!(log.query(&AlertQuery::default()).await.unwrap().len(), 1);
    }
}
