//! HTTP request handlers

pub mod alerts;
pub mod assessment;
pub mod earthquakes;
pub mod health;

pub use alerts::list_alerts;
pub use assessment::{assess_cyclone_risk, assess_flood_risk, assess_tsunami_risk, predict_hazard};
pub use earthquakes::get_earthquakes;
pub use health::{health_check, models_info};
