//! Rule-based cyclone scorer
//!
//! Cyclone risk has no learned model. Current conditions are scored with a
//! fixed-weight blend of geographic, pressure, wind and humidity components.
//! All thresholds and weights live in [`CycloneScoringTable`] so deployments
//! can override them from configuration.

use serde::{Deserialize, Serialize};

use crate::features::CycloneConditions;
use crate::models::{CycloneFactors, CyclonePrediction, RiskLevel, WeatherSnapshot};
use crate::risk::ThresholdTable;
use crate::types::HazardType;
use crate::validation::clamp_probability;

/// Direction a [`StepScore`] compares in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Row matches when `value < limit`
    Below,
    /// Row matches when `value >= limit`
    AtLeast,
}

/// Stepped score: first matching `(limit, score)` row wins
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepScore {
    pub step: Step,
    pub rows: Vec<(f64, f64)>,
    pub otherwise: f64,
}

impl StepScore {
    pub fn score(&self, value: f64) -> f64 {
        self.rows
            .iter()
            .find(|(limit, _)| match self.step {
                Step::Below => value < *limit,
                Step::AtLeast => value >= *limit,
            })
            .map(|(_, score)| *score)
            .unwrap_or(self.otherwise)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CycloneWeights {
    pub geographic: f64,
    pub pressure: f64,
    pub wind: f64,
    pub humidity: f64,
}

impl Default for CycloneWeights {
    fn default() -> Self {
        Self {
            geographic: 0.3,
            pressure: 0.4,
            wind: 0.2,
            humidity: 0.1,
        }
    }
}

/// Whether a level row implies a positive cyclone prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "rule", content = "score")]
pub enum PredictRule {
    Always,
    Never,
    /// Positive only when the combined score exceeds the value
    Above(f64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CycloneOutcome {
    pub level: RiskLevel,
    pub predict: PredictRule,
    /// Confidence reported alongside the level
    pub confidence: f64,
    /// Wind intensification `(multiplier, floor m/s)`, if any
    pub intensification: Option<(f64, f64)>,
}

/// Named, overridable scoring policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CycloneScoringTable {
    /// Base risk by |latitude|
    pub geographic: StepScore,
    /// Pressure risk by hPa
    pub pressure: StepScore,
    /// Wind risk by m/s
    pub wind: StepScore,
    pub weights: CycloneWeights,
    /// Combined score to outcome
    pub levels: ThresholdTable<CycloneOutcome>,
    /// |longitude| above which a point is reported as oceanic
    pub oceanic_longitude_min: f64,
}

impl Default for CycloneScoringTable {
    fn default() -> Self {
        Self {
            geographic: StepScore {
                step: Step::Below,
                rows: vec![(23.5, 0.8), (40.0, 0.4)],
                otherwise: 0.1,
            },
            pressure: StepScore {
                step: Step::Below,
                rows: vec![(1000.0, 0.9), (1005.0, 0.7), (1010.0, 0.4)],
                otherwise: 0.1,
            },
            wind: StepScore {
                step: Step::AtLeast,
                rows: vec![(25.0, 0.8), (15.0, 0.5), (10.0, 0.3)],
                otherwise: 0.1,
            },
            weights: CycloneWeights::default(),
            levels: ThresholdTable::new(
                vec![
                    (
                        0.7,
                        CycloneOutcome {
                            level: RiskLevel::Extreme,
                            predict: PredictRule::Always,
                            confidence: 0.9,
                            intensification: Some((1.5, 30.0)),
                        },
                    ),
                    (
                        0.5,
                        CycloneOutcome {
                            level: RiskLevel::High,
                            predict: PredictRule::Always,
                            confidence: 0.85,
                            intensification: Some((1.3, 25.0)),
                        },
                    ),
                    (
                        0.3,
                        CycloneOutcome {
                            level: RiskLevel::Medium,
                            predict: PredictRule::Above(0.4),
                            confidence: 0.75,
                            intensification: Some((1.2, 18.0)),
                        },
                    ),
                    (
                        0.15,
                        CycloneOutcome {
                            level: RiskLevel::Low,
                            predict: PredictRule::Never,
                            confidence: 0.6,
                            intensification: Some((1.1, 12.0)),
                        },
                    ),
                ],
                CycloneOutcome {
                    level: RiskLevel::NoRisk,
                    predict: PredictRule::Never,
                    confidence: 0.7,
                    intensification: None,
                },
            ),
            oceanic_longitude_min: 0.0,
        }
    }
}

/// Full breakdown of one cyclone score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycloneScore {
    pub geographic_risk: f64,
    pub pressure_risk: f64,
    pub wind_risk: f64,
    pub humidity_risk: f64,
    pub combined: f64,
    pub level: RiskLevel,
    pub predicted: bool,
    pub confidence: f64,
    pub predicted_wind_speed: f64,
    pub oceanic: bool,
    pub contributing_factors: Vec<String>,
    pub factors: CycloneFactors,
}

impl CycloneScore {
    pub fn prediction(&self) -> CyclonePrediction {
        CyclonePrediction {
            prediction: self.predicted,
            risk_level: self.level,
            risk_label: self.level.label(HazardType::Cyclone).to_string(),
            confidence: self.confidence,
            predicted_wind_speed: self.predicted_wind_speed,
            risk_factors: self.factors.clone(),
        }
    }
}

impl CycloneConditions {
    pub fn from_snapshot(latitude: f64, longitude: f64, weather: &WeatherSnapshot) -> Self {
        Self {
            latitude,
            longitude,
            pressure_hpa: weather.pressure_hpa,
            wind_speed_mps: weather.wind_speed_mps,
            humidity_percent: weather.humidity_percent,
        }
    }
}

impl CycloneScoringTable {
    pub fn score(&self, conditions: &CycloneConditions) -> CycloneScore {
        let geographic_risk = self.geographic.score(conditions.latitude.abs());
        let pressure_risk = self.pressure.score(conditions.pressure_hpa);
        let wind_risk = self.wind.score(conditions.wind_speed_mps);
        let humidity_risk = (conditions.humidity_percent / 100.0).clamp(0.0, 1.0);

        let w = &self.weights;
        let combined = clamp_probability(
            w.geographic * geographic_risk
                + w.pressure * pressure_risk
                + w.wind * wind_risk
                + w.humidity * humidity_risk,
        );

        let outcome = self.levels.evaluate(combined);
        let predicted = match outcome.predict {
            PredictRule::Always => true,
            PredictRule::Never => false,
            PredictRule::Above(limit) => combined > limit,
        };
        let wind = conditions.wind_speed_mps;
        let predicted_wind_speed = match outcome.intensification {
            Some((multiplier, floor)) => (wind * multiplier).max(floor),
            None => wind,
        };
        let oceanic = conditions.longitude.abs() > self.oceanic_longitude_min;

        let factors = CycloneFactors {
            geographic_risk,
            pressure_risk,
            wind_risk,
            humidity_risk,
            combined_risk: combined,
            pressure_factor: pressure_narrative(conditions.pressure_hpa),
            wind_factor: wind_narrative(wind),
            combined_assessment: combined_narrative(predicted, pressure_risk, wind_risk),
        };

        let contributing_factors = vec![
            format!(
                "Geographic base risk {:.2} at {:.1}° latitude{}",
                geographic_risk,
                conditions.latitude.abs(),
                if oceanic { " (oceanic)" } else { "" }
            ),
            factors.pressure_factor.clone(),
            factors.wind_factor.clone(),
            format!("Humidity {:.0}%", conditions.humidity_percent),
        ];

        CycloneScore {
            geographic_risk,
            pressure_risk,
            wind_risk,
            humidity_risk,
            combined,
            level: outcome.level,
            predicted,
            confidence: outcome.confidence,
            predicted_wind_speed,
            oceanic,
            contributing_factors,
            factors,
        }
    }
}

fn pressure_narrative(pressure: f64) -> String {
    if pressure < 980.0 {
        format!("Extremely low pressure ({:.0} hPa) - Strong cyclone formation indicator", pressure)
    } else if pressure < 990.0 {
        format!("Very low pressure ({:.0} hPa) - Significant cyclone development risk", pressure)
    } else if pressure < 995.0 {
        format!("Low pressure ({:.0} hPa) - Moderate cyclone formation potential", pressure)
    } else if pressure < 1005.0 {
        format!("Below normal pressure ({:.0} hPa) - Mild atmospheric instability", pressure)
    } else {
        format!("Normal pressure ({:.0} hPa) - Stable atmospheric conditions", pressure)
    }
}

fn wind_narrative(wind: f64) -> String {
    if wind > 25.0 {
        format!("Very high winds ({:.1} m/s) - Conducive to rapid cyclone intensification", wind)
    } else if wind > 20.0 {
        format!("High winds ({:.1} m/s) - Favorable for cyclone development", wind)
    } else if wind > 15.0 {
        format!("Elevated winds ({:.1} m/s) - Some potential for system organization", wind)
    } else if wind > 10.0 {
        format!("Moderate winds ({:.1} m/s) - Limited cyclone formation potential", wind)
    } else {
        format!("Light winds ({:.1} m/s) - Minimal cyclone development risk", wind)
    }
}

fn combined_narrative(predicted: bool, pressure_risk: f64, wind_risk: f64) -> String {
    if predicted {
        let pressure = if pressure_risk >= 0.7 {
            "low pressure"
        } else {
            "pressure variations"
        };
        let wind = if wind_risk >= 0.3 {
            "elevated winds"
        } else {
            "wind patterns"
        };
        format!(
            "Current atmospheric conditions favor cyclone formation. The combination of {} and {} creates an environment conducive to tropical system development.",
            pressure, wind
        )
    } else {
        "Current atmospheric conditions are not conducive to cyclone formation. Pressure and wind patterns indicate stable weather conditions.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(lat: f64, pressure: f64, wind: f64, humidity: f64) -> CycloneConditions {
        CycloneConditions {
            latitude: lat,
            longitude: 140.0,
            pressure_hpa: pressure,
            wind_speed_mps: wind,
            humidity_percent: humidity,
        }
    }

    #[test]
    fn test_tropical_low_pressure_is_extreme() {
        let score = CycloneScoringTable::default().score(&conditions(10.0, 995.0, 28.0, 0.0));
        // 0.3*0.8 + 0.4*0.9 + 0.2*0.8 = 0.76
        assert!((score.combined - 0.76).abs() < 1e-9);
        assert_eq!(score.level, RiskLevel::Extreme);
        assert!(score.predicted);
        assert_eq!(score.prediction().risk_label, "Extreme Risk");
        assert!((score.predicted_wind_speed - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_moderate_predict_depends_on_score() {
        let table = CycloneScoringTable::default();
        // temperate, 1007 hPa, calm, dry: 0.03 + 0.16 + 0.02 = 0.21 -> low
        let low = table.score(&conditions(45.0, 1007.0, 5.0, 0.0));
        assert_eq!(low.level, RiskLevel::Low);
        assert!(!low.predicted);

        // subtropical, 1007 hPa, 12 m/s, 50%: 0.12 + 0.16 + 0.06 + 0.05 = 0.39
        let moderate = table.score(&conditions(30.0, 1007.0, 12.0, 50.0));
        assert_eq!(moderate.level, RiskLevel::Medium);
        assert!(!moderate.predicted);

        // subtropical, 1003 hPa, 12 m/s, 50%: 0.12 + 0.28 + 0.06 + 0.05 = 0.51 -> high
        let high = table.score(&conditions(30.0, 1003.0, 12.0, 50.0));
        assert_eq!(high.level, RiskLevel::High);

        // subtropical, 1007 hPa, 15 m/s, 80%: 0.12 + 0.16 + 0.10 + 0.08 = 0.46
        let moderate = table.score(&conditions(30.0, 1007.0, 15.0, 80.0));
        assert_eq!(moderate.level, RiskLevel::Medium);
        assert!(moderate.predicted);
    }

    #[test]
    fn test_calm_temperate_is_no_risk() {
        let score = CycloneScoringTable::default().score(&conditions(60.0, 1020.0, 2.0, 10.0));
        assert_eq!(score.level, RiskLevel::NoRisk);
        assert!(!score.predicted);
        assert_eq!(score.predicted_wind_speed, 2.0);
        assert_eq!(score.prediction().risk_label, "No Risk");
    }

    #[test]
    fn test_step_boundaries() {
        let table = CycloneScoringTable::default();
        assert_eq!(table.pressure.score(1000.0), 0.7);
        assert_eq!(table.pressure.score(1010.0), 0.1);
        assert_eq!(table.wind.score(25.0), 0.8);
        assert_eq!(table.wind.score(9.99), 0.1);
        assert_eq!(table.geographic.score(23.5), 0.4);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let table: CycloneScoringTable =
            serde_json::from_str(r#"{"weights":{"humidity":0.0},"oceanic_longitude_min":20.0}"#)
                .unwrap();
        assert_eq!(table.weights.pressure, 0.4);
        assert_eq!(table.weights.humidity, 0.0);
        let score = table.score(&CycloneConditions {
            longitude: 12.0,
            ..conditions(10.0, 995.0, 28.0, 100.0)
        });
        assert!(!score.oceanic);
        assert!((score.combined - 0.76).abs() < 1e-9);
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(CycloneScoringTable::default().levels.is_ordered());
    }
}
