//! Hazard model registry
//!
//! Models are loaded once at startup from `<directory>/<hazard>.json`
//! descriptors. A missing descriptor is a normal state: the hazard is simply
//! reported as unavailable.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Serialize;
use shared::predictor::{ModelDescriptor, ModelInfo, Predictor};
use shared::HazardType;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<HazardType, Predictor>,
}

/// Summary returned by the models endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RegistryInfo {
    pub models: BTreeMap<HazardType, ModelInfo>,
    pub total_loaded: usize,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predictor, replacing any previous model for the hazard
    pub fn with_model(mut self, hazard: HazardType, predictor: Predictor) -> Self {
        self.models.insert(hazard, predictor);
        self
    }

    /// Load every `<hazard>.json` descriptor found in `dir`
    pub fn load_dir(dir: &Path) -> AppResult<Self> {
        let mut registry = Self::new();
        if !dir.is_dir() {
            tracing::warn!(directory = %dir.display(), "Model directory not found, no models loaded");
            return Ok(registry);
        }

        for hazard in HazardType::ALL {
            let path = dir.join(format!("{}.json", hazard.as_str()));
            if !path.exists() {
                tracing::info!(hazard = %hazard, "No model descriptor, hazard unavailable");
                continue;
            }

            let raw = std::fs::read_to_string(&path).map_err(|e| {
                AppError::Configuration(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let descriptor: ModelDescriptor = serde_json::from_str(&raw).map_err(|e| {
                AppError::Configuration(format!("Invalid model descriptor {}: {}", path.display(), e))
            })?;
            let predictor = descriptor.into_predictor()?;

            if let Some(expected) = hazard.feature_count() {
                let actual = predictor.info().feature_count;
                if actual != expected {
                    return Err(AppError::Configuration(format!(
                        "{} model declares {} features, expected {}",
                        hazard, actual, expected
                    )));
                }
            }

            tracing::info!(
                hazard = %hazard,
                model = %predictor.info().name,
                probability_capable = predictor.info().probability_capable,
                "Loaded hazard model"
            );
            registry.models.insert(hazard, predictor);
        }

        Ok(registry)
    }

    pub fn get(&self, hazard: HazardType) -> Option<&Predictor> {
        self.models.get(&hazard)
    }

    /// The predictor for `hazard`, or `ModelUnavailable`
    pub fn require(&self, hazard: HazardType) -> AppResult<&Predictor> {
        self.get(hazard).ok_or(AppError::ModelUnavailable(hazard))
    }

    pub fn available(&self) -> Vec<HazardType> {
        let mut hazards: Vec<HazardType> = self.models.keys().copied().collect();
        hazards.sort();
        hazards
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn info(&self) -> RegistryInfo {
        RegistryInfo {
            models: self
                .models
                .iter()
                .map(|(hazard, predictor)| (*hazard, predictor.info()))
                .collect(),
            total_loaded: self.models.len(),
        }
    }
}
