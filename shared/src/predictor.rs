//! Predictor capabilities over heterogeneous hazard models
//!
//! A model either produces calibrated probabilities or only a binary label.
//! Callers branch on the [`Predictor`] variant instead of probing the model.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::models::Confidence;
use crate::validation::{clamp_probability, ValidationError};

/// Binary classifier over a fixed-width feature vector
pub trait Classifier: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn feature_names(&self) -> &[String];

    fn classify(&self, features: &[f64]) -> bool;

    fn feature_count(&self) -> usize {
        self.feature_names().len()
    }
}

/// Classifier that can also report P(positive)
pub trait ProbabilityModel: Classifier {
    fn probability(&self, features: &[f64]) -> f64;
}

/// A loaded hazard model, tagged by capability
#[derive(Debug, Clone)]
pub enum Predictor {
    Probabilistic(Arc<dyn ProbabilityModel>),
    ClassifyOnly(Arc<dyn Classifier>),
}

/// Probability with an honest account of where it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub probability: f64,
    pub predicted: bool,
    pub confidence: Confidence,
}

/// Model metadata exposed to operators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub probability_capable: bool,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl Predictor {
    fn name(&self) -> &str {
        match self {
            Predictor::Probabilistic(model) => model.name(),
            Predictor::ClassifyOnly(model) => model.name(),
        }
    }

    fn feature_names(&self) -> &[String] {
        match self {
            Predictor::Probabilistic(model) => model.feature_names(),
            Predictor::ClassifyOnly(model) => model.feature_names(),
        }
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            name: self.name().to_string(),
            probability_capable: matches!(self, Predictor::Probabilistic(_)),
            feature_count: self.feature_names().len(),
            feature_names: self.feature_names().to_vec(),
        }
    }

    fn check_width(&self, features: &FeatureVector) -> Result<(), ValidationError> {
        let expected = self.feature_names().len();
        if features.len() != expected {
            return Err(ValidationError::new(
                "features",
                format!(
                    "Model '{}' expects {} features, got {}",
                    self.name(),
                    expected,
                    features.len()
                ),
            ));
        }
        Ok(())
    }

    pub fn classify(&self, features: &FeatureVector) -> Result<bool, ValidationError> {
        self.check_width(features)?;
        Ok(match self {
            Predictor::Probabilistic(model) => model.classify(features.values()),
            Predictor::ClassifyOnly(model) => model.classify(features.values()),
        })
    }

    /// Calibrated probability, absent for classify-only models
    pub fn probability(&self, features: &FeatureVector) -> Result<Option<f64>, ValidationError> {
        self.check_width(features)?;
        Ok(match self {
            Predictor::Probabilistic(model) => {
                Some(clamp_probability(model.probability(features.values())))
            }
            Predictor::ClassifyOnly(_) => None,
        })
    }

    /// Probability for risk mapping.
    ///
    /// Classify-only models map their label to 1.0 / 0.0 and are flagged
    /// [`Confidence::Degraded`].
    pub fn estimate(&self, features: &FeatureVector) -> Result<Estimate, ValidationError> {
        let predicted = self.classify(features)?;
        Ok(match self.probability(features)? {
            Some(probability) => Estimate {
                probability,
                predicted,
                confidence: Confidence::Calibrated,
            },
            None => Estimate {
                probability: if predicted { 1.0 } else { 0.0 },
                predicted,
                confidence: Confidence::Degraded,
            },
        })
    }
}

// ============================================================================
// Linear models
// ============================================================================

/// Per-feature standardisation `(x - mean) / scale`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (mean, scale))| {
                if *scale == 0.0 {
                    x - mean
                } else {
                    (x - mean) / scale
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct LinearTerms {
    feature_names: Vec<String>,
    weights: Vec<f64>,
    intercept: f64,
    #[serde(default)]
    scaler: Option<StandardScaler>,
}

impl LinearTerms {
    fn score(&self, features: &[f64]) -> f64 {
        let scaled;
        let x = match &self.scaler {
            Some(scaler) => {
                scaled = scaler.transform(features);
                scaled.as_slice()
            }
            None => features,
        };
        self.intercept + x.iter().zip(&self.weights).map(|(x, w)| x * w).sum::<f64>()
    }

    fn validate(&self, name: &str) -> Result<(), ValidationError> {
        let width = self.feature_names.len();
        if width == 0 {
            return Err(ValidationError::new(
                "feature_names",
                format!("Model '{}' declares no features", name),
            ));
        }
        if self.weights.len() != width {
            return Err(ValidationError::new(
                "weights",
                format!(
                    "Model '{}' has {} weights for {} features",
                    name,
                    self.weights.len(),
                    width
                ),
            ));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != width || scaler.scale.len() != width {
                return Err(ValidationError::new(
                    "scaler",
                    format!("Model '{}' scaler does not match {} features", name, width),
                ));
            }
        }
        Ok(())
    }
}

/// Logistic regression: probability-capable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogisticModel {
    pub name: String,
    #[serde(flatten)]
    terms: LinearTerms,
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,
}

fn default_decision_threshold() -> f64 {
    0.5
}

impl LogisticModel {
    pub fn new(
        name: impl Into<String>,
        feature_names: Vec<String>,
        weights: Vec<f64>,
        intercept: f64,
        scaler: Option<StandardScaler>,
    ) -> Result<Self, ValidationError> {
        let model = Self {
            name: name.into(),
            terms: LinearTerms {
                feature_names,
                weights,
                intercept,
                scaler,
            },
            decision_threshold: default_decision_threshold(),
        };
        model.terms.validate(&model.name)?;
        Ok(model)
    }
}

impl Classifier for LogisticModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.terms.feature_names
    }

    fn classify(&self, features: &[f64]) -> bool {
        self.probability(features) >= self.decision_threshold
    }
}

impl ProbabilityModel for LogisticModel {
    fn probability(&self, features: &[f64]) -> f64 {
        let z = self.terms.score(features);
        1.0 / (1.0 + (-z).exp())
    }
}

/// Linear decision function: sign of the score, no probability
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearDecisionModel {
    pub name: String,
    #[serde(flatten)]
    terms: LinearTerms,
}

impl LinearDecisionModel {
    pub fn new(
        name: impl Into<String>,
        feature_names: Vec<String>,
        weights: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, ValidationError> {
        let model = Self {
            name: name.into(),
            terms: LinearTerms {
                feature_names,
                weights,
                intercept,
                scaler: None,
            },
        };
        model.terms.validate(&model.name)?;
        Ok(model)
    }
}

impl Classifier for LinearDecisionModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.terms.feature_names
    }

    fn classify(&self, features: &[f64]) -> bool {
        self.terms.score(features) > 0.0
    }
}

/// On-disk model description, one per hazard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelDescriptor {
    Logistic(LogisticModel),
    LinearDecision(LinearDecisionModel),
}

impl ModelDescriptor {
    pub fn into_predictor(self) -> Result<Predictor, ValidationError> {
        match self {
            ModelDescriptor::Logistic(model) => {
                model.terms.validate(&model.name)?;
                Ok(Predictor::Probabilistic(Arc::new(model)))
            }
            ModelDescriptor::LinearDecision(model) => {
                model.terms.validate(&model.name)?;
                Ok(Predictor::ClassifyOnly(Arc::new(model)))
            }
        }
    }
}
