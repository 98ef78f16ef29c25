//! Feature engineering: raw hazard inputs to model-ready vectors
//!
//! Every builder is pure and validates its input before producing a vector.
//! Field order is part of the model contract and must not change.

use serde::{Deserialize, Serialize};

use crate::geo::is_oceanic;
use crate::models::RainfallSeries;
use crate::types::HazardType;
use crate::validation::{
    validate_depth, validate_latitude, validate_longitude, validate_magnitude, validate_year,
    ValidationError,
};

pub const TSUNAMI_FEATURE_NAMES: [&str; 11] = [
    "eq_magnitude",
    "eq_depth",
    "latitude",
    "longitude",
    "mag_squared",
    "is_major_eq",
    "is_shallow",
    "is_oceanic",
    "risk_zone_encoded",
    "mag_category_encoded",
    "depth_category_encoded",
];

pub const FLOOD_FEATURE_NAMES: [&str; 13] = [
    "YEAR", "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Magnitude at or above which an earthquake counts as major
pub const MAJOR_MAGNITUDE: f64 = 7.0;
/// Depth (km) at or below which an earthquake counts as shallow
pub const SHALLOW_DEPTH_KM: f64 = 70.0;

/// Ordered numeric input for a hazard predictor
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureVector {
    hazard: HazardType,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Wrap caller-supplied values, checking length against the hazard's layout
    pub fn from_raw(hazard: HazardType, values: Vec<f64>) -> Result<Self, ValidationError> {
        if let Some(expected) = hazard.feature_count() {
            if values.len() != expected {
                return Err(ValidationError::new(
                    "features",
                    format!(
                        "{} model expects {} features, got {}",
                        hazard,
                        expected,
                        values.len()
                    ),
                ));
            }
        }
        if values.is_empty() {
            return Err(ValidationError::new("features", "Feature vector is empty"));
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(ValidationError::new(
                "features",
                format!("Feature {} is not a finite number", idx),
            ));
        }
        Ok(Self { hazard, values })
    }

    pub fn hazard(&self) -> HazardType {
        self.hazard
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Seismic -> tsunami
// ============================================================================

/// Basic earthquake parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TsunamiInput {
    pub magnitude: f64,
    #[serde(alias = "depth_km")]
    pub depth: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl TsunamiInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_magnitude(self.magnitude)?;
        validate_depth(self.depth)?;
        validate_latitude(self.latitude)?;
        validate_longitude(self.longitude)
    }

    pub fn is_major(&self) -> bool {
        self.magnitude >= MAJOR_MAGNITUDE
    }

    pub fn is_shallow(&self) -> bool {
        self.depth <= SHALLOW_DEPTH_KM
    }
}

/// `clamp(floor(magnitude - 4), 0, 4)`
pub fn magnitude_bucket(magnitude: f64) -> f64 {
    (magnitude - 4.0).floor().clamp(0.0, 4.0)
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Build the 11-value tsunami vector
pub fn tsunami_features(input: &TsunamiInput) -> Result<FeatureVector, ValidationError> {
    input.validate()?;

    let bucket = magnitude_bucket(input.magnitude);
    let values = vec![
        input.magnitude,
        input.depth,
        input.latitude,
        input.longitude,
        input.magnitude * input.magnitude,
        flag(input.is_major()),
        flag(input.is_shallow()),
        flag(is_oceanic(input.latitude, input.longitude)),
        bucket,
        bucket,
        flag(!input.is_shallow()),
    ];

    Ok(FeatureVector {
        hazard: HazardType::Tsunami,
        values,
    })
}

// ============================================================================
// Rainfall -> flood
// ============================================================================

/// Year plus twelve monthly rainfall totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloodInput {
    pub year: i32,
    pub monthly_rainfall: Vec<f64>,
}

/// Build the 13-value flood vector `[year, jan..dec]`
pub fn flood_features(year: i32, rainfall: &RainfallSeries) -> Result<FeatureVector, ValidationError> {
    validate_year(year)?;
    let mut values = Vec::with_capacity(FLOOD_FEATURE_NAMES.len());
    values.push(f64::from(year));
    values.extend_from_slice(rainfall.months());
    Ok(FeatureVector {
        hazard: HazardType::Flood,
        values,
    })
}

impl FloodInput {
    /// Validates the series length before building features
    pub fn features(&self) -> Result<FeatureVector, ValidationError> {
        let series = RainfallSeries::from_slice(&self.monthly_rainfall)?;
        flood_features(self.year, &series)
    }
}

// ============================================================================
// Raw inputs for the direct predict path
// ============================================================================

/// Current conditions scored by the rule-based cyclone table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CycloneConditions {
    pub latitude: f64,
    pub longitude: f64,
    pub pressure_hpa: f64,
    pub wind_speed_mps: f64,
    pub humidity_percent: f64,
}

impl CycloneConditions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_latitude(self.latitude)?;
        validate_longitude(self.longitude)?;
        if !self.pressure_hpa.is_finite() || self.pressure_hpa <= 0.0 {
            return Err(ValidationError::new(
                "pressure_hpa",
                "Pressure must be a positive number",
            ));
        }
        if !self.wind_speed_mps.is_finite() || self.wind_speed_mps < 0.0 {
            return Err(ValidationError::new(
                "wind_speed_mps",
                "Wind speed must be non-negative",
            ));
        }
        if !(0.0..=100.0).contains(&self.humidity_percent) {
            return Err(ValidationError::new(
                "humidity_percent",
                "Humidity must be between 0 and 100",
            ));
        }
        Ok(())
    }
}

/// Inputs accepted by the non-geospatial predict operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawFeatureInput {
    Tsunami(TsunamiInput),
    Cyclone(CycloneConditions),
    Flood(FloodInput),
    /// A pre-built vector passed straight to the model
    Vector { features: Vec<f64> },
}

impl RawFeatureInput {
    /// Engineer the learned-model vector for `hazard`.
    ///
    /// Cyclone conditions have no learned vector and are rejected here;
    /// they go through the rule table instead.
    pub fn to_features(&self, hazard: HazardType) -> Result<FeatureVector, ValidationError> {
        match (hazard, self) {
            (HazardType::Tsunami, RawFeatureInput::Tsunami(input)) => tsunami_features(input),
            (HazardType::Flood, RawFeatureInput::Flood(input)) => input.features(),
            (_, RawFeatureInput::Vector { features }) => {
                FeatureVector::from_raw(hazard, features.clone())
            }
            (hazard, other) => Err(ValidationError::new(
                "inputs",
                format!("{} inputs cannot be used for {} prediction", other.kind(), hazard),
            )),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RawFeatureInput::Tsunami(_) => "Earthquake",
            RawFeatureInput::Cyclone(_) => "Cyclone condition",
            RawFeatureInput::Flood(_) => "Rainfall",
            RawFeatureInput::Vector { .. } => "Vector",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn japan_trench() -> TsunamiInput {
        TsunamiInput {
            magnitude: 8.2,
            depth: 15.0,
            latitude: 38.0,
            longitude: 142.0,
        }
    }

    #[test]
    fn test_tsunami_feature_order() {
        let fv = tsunami_features(&japan_trench()).unwrap();
        assert_eq!(fv.len(), TSUNAMI_FEATURE_NAMES.len());
        let v = fv.values();
        assert_eq!(v[0], 8.2);
        assert_eq!(v[1], 15.0);
        assert!((v[4] - 67.24).abs() < 1e-9);
        assert_eq!(v[5], 1.0); // major
        assert_eq!(v[6], 1.0); // shallow
        assert_eq!(v[8], 4.0);
        assert_eq!(v[9], 4.0);
        assert_eq!(v[10], 0.0);
    }

    #[test]
    fn test_tsunami_buckets_clamp() {
        assert_eq!(magnitude_bucket(1.0), 0.0);
        assert_eq!(magnitude_bucket(4.99), 0.0);
        assert_eq!(magnitude_bucket(6.5), 2.0);
        assert_eq!(magnitude_bucket(10.0), 4.0);

        let deep = TsunamiInput {
            depth: 300.0,
            ..japan_trench()
        };
        let v = tsunami_features(&deep).unwrap();
        assert_eq!(v.values()[6], 0.0);
        assert_eq!(v.values()[10], 1.0);
    }

    #[test]
    fn test_tsunami_rejects_out_of_range() {
        let bad = TsunamiInput {
            magnitude: 11.0,
            ..japan_trench()
        };
        assert_eq!(tsunami_features(&bad).unwrap_err().field, "magnitude");

        let bad = TsunamiInput {
            latitude: 91.0,
            ..japan_trench()
        };
        assert_eq!(tsunami_features(&bad).unwrap_err().field, "latitude");

        let bad = TsunamiInput {
            depth: -1.0,
            ..japan_trench()
        };
        assert!(tsunami_features(&bad).is_err());
    }

    #[test]
    fn test_flood_features_layout() {
        let series = RainfallSeries::from_slice(&[0.0; 12]).unwrap();
        let fv = flood_features(2024, &series).unwrap();
        assert_eq!(fv.len(), 13);
        assert_eq!(fv.values()[0], 2024.0);
        assert_eq!(fv.hazard(), HazardType::Flood);
    }

    #[test]
    fn test_flood_input_wrong_length_is_rejected() {
        for len in [0, 11, 13] {
            let input = FloodInput {
                year: 2024,
                monthly_rainfall: vec![10.0; len],
            };
            assert!(input.features().is_err(), "length {} accepted", len);
        }
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(FeatureVector::from_raw(HazardType::Tsunami, vec![1.0; 10]).is_err());
        assert!(FeatureVector::from_raw(HazardType::Tsunami, vec![1.0; 11]).is_ok());
        assert!(FeatureVector::from_raw(HazardType::Flood, vec![f64::NAN; 13]).is_err());
        // cyclone models declare their own width
        assert!(FeatureVector::from_raw(HazardType::Cyclone, vec![1.0; 7]).is_ok());
    }

    #[test]
    fn test_raw_input_untagged_parsing() {
        let raw: RawFeatureInput =
            serde_json::from_str(r#"{"magnitude":7.5,"depth":25,"latitude":38,"longitude":142}"#)
                .unwrap();
        assert!(matches!(raw, RawFeatureInput::Tsunami(_)));
        assert!(raw.to_features(HazardType::Tsunami).is_ok());
        assert!(raw.to_features(HazardType::Flood).is_err());

        let raw: RawFeatureInput = serde_json::from_str(
            r#"{"latitude":10,"longitude":140,"pressure_hpa":995,"wind_speed_mps":28,"humidity_percent":80}"#,
        )
        .unwrap();
        assert!(matches!(raw, RawFeatureInput::Cyclone(_)));

        let raw: RawFeatureInput =
            serde_json::from_str(r#"{"year":2024,"monthly_rainfall":[1,2,3,4,5,6,7,8,9,10,11,12]}"#)
                .unwrap();
        assert!(matches!(raw, RawFeatureInput::Flood(_)));

        let raw: RawFeatureInput = serde_json::from_str(r#"{"features":[1,2,3]}"#).unwrap();
        assert!(matches!(raw, RawFeatureInput::Vector { .. }));
    }
}
