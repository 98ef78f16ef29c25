//! Shared domain logic for the WaveGuard hazard risk platform
//!
//! This crate contains the pure parts of the assessment pipeline shared
//! between the backend services and the browser frontend (via WASM):
//! geometry, feature engineering, predictor capabilities, risk tables and
//! recommendation templates. Nothing in here performs I/O.

pub mod cyclone;
pub mod features;
pub mod geo;
pub mod models;
pub mod predictor;
pub mod recommendations;
pub mod risk;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
