//! Business logic services for the WaveGuard platform

pub mod alert_composer;
pub mod alert_log;
pub mod assessment;
pub mod clock;
pub mod dispatcher;
pub mod model_registry;
pub mod monitor;

pub use alert_log::{AlertLog, AlertQuery, JsonFileAlertLog, PgAlertLog};
pub use assessment::AssessmentService;
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::{AlertDispatcher, AlertSink, LogSink, WebhookSink};
pub use model_registry::ModelRegistry;
pub use monitor::{CycleReport, HazardOutcome, Monitor, MonitorState};
