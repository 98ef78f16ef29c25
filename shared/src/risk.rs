//! Risk classification tables
//!
//! Each hazard's policy is an ordered list of `(threshold, outcome)` rows
//! evaluated top-down, so the policy is data and can be tested on its own.

use serde::{Deserialize, Serialize};

use crate::models::RiskLevel;

// ============================================================================
// Threshold tables
// ============================================================================

/// Ordered `(threshold, outcome)` rows; the first row with `value >= threshold` wins
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdTable<T> {
    pub rows: Vec<(f64, T)>,
    /// Outcome when no row matches
    pub floor: T,
}

impl<T: Clone> ThresholdTable<T> {
    pub fn new(rows: Vec<(f64, T)>, floor: T) -> Self {
        Self { rows, floor }
    }

    pub fn evaluate(&self, value: f64) -> T {
        self.rows
            .iter()
            .find(|(threshold, _)| value >= *threshold)
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| self.floor.clone())
    }

    /// True when thresholds are strictly descending
    pub fn is_ordered(&self) -> bool {
        self.rows.windows(2).all(|w| w[0].0 > w[1].0)
    }
}

/// ≥0.8 Extreme, ≥0.64 High, ≥0.4 Medium, ≥0.2 Low, else VeryLow
pub fn flood_table() -> ThresholdTable<RiskLevel> {
    ThresholdTable::new(
        vec![
            (0.8, RiskLevel::Extreme),
            (0.64, RiskLevel::High),
            (0.4, RiskLevel::Medium),
            (0.2, RiskLevel::Low),
        ],
        RiskLevel::VeryLow,
    )
}

/// Risk of an earthquake itself: ≥0.7 High, ≥0.3 Medium, else Low
pub fn tsunami_event_table() -> ThresholdTable<RiskLevel> {
    ThresholdTable::new(
        vec![(0.7, RiskLevel::High), (0.3, RiskLevel::Medium)],
        RiskLevel::Low,
    )
}

pub fn flood_level(probability: f64) -> RiskLevel {
    flood_table().evaluate(probability)
}

pub fn tsunami_event_level(probability: f64) -> RiskLevel {
    tsunami_event_table().evaluate(probability)
}

// ============================================================================
// Tsunami distance zoning
// ============================================================================

/// Below this probability an event never puts the user at risk
pub const TSUNAMI_MIN_PROBABILITY: f64 = 0.3;

/// One concentric band around an epicentre
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DistanceBand {
    pub max_km: f64,
    /// Probability at or above which `strong` applies instead of `weak`
    pub strong_probability: f64,
    pub strong: RiskLevel,
    pub weak: RiskLevel,
}

pub const TSUNAMI_BANDS: [DistanceBand; 3] = [
    DistanceBand {
        max_km: 100.0,
        strong_probability: 0.7,
        strong: RiskLevel::High,
        weak: RiskLevel::Medium,
    },
    DistanceBand {
        max_km: 500.0,
        strong_probability: 0.8,
        strong: RiskLevel::Medium,
        weak: RiskLevel::Low,
    },
    DistanceBand {
        max_km: 1000.0,
        strong_probability: 0.8,
        strong: RiskLevel::Low,
        weak: RiskLevel::NoRisk,
    },
];

/// Risk for a user `distance_km` from an event with the given verdict
pub fn tsunami_user_zone(probability: f64, predicted: bool, distance_km: f64) -> RiskLevel {
    if !predicted || probability < TSUNAMI_MIN_PROBABILITY {
        return RiskLevel::NoRisk;
    }
    TSUNAMI_BANDS
        .iter()
        .find(|band| distance_km <= band.max_km)
        .map(|band| {
            if probability >= band.strong_probability {
                band.strong
            } else {
                band.weak
            }
        })
        .unwrap_or(RiskLevel::NoRisk)
}

/// One-line explanation of a user zone verdict
pub fn tsunami_zone_reasoning(
    zone: RiskLevel,
    probability: f64,
    predicted: bool,
    distance_km: f64,
) -> String {
    if !predicted || probability < TSUNAMI_MIN_PROBABILITY {
        return format!(
            "Tsunami unlikely for this event ({:.0}% probability)",
            probability * 100.0
        );
    }
    match zone {
        RiskLevel::NoRisk | RiskLevel::VeryLow => format!(
            "Event is {:.0} km away, outside the tsunami impact range",
            distance_km
        ),
        _ => format!(
            "{:.0}% tsunami probability at {:.0} km from your location",
            probability * 100.0,
            distance_km
        ),
    }
}

/// Overall status wording for the highest user zone
pub fn overall_status(zone: RiskLevel) -> &'static str {
    match zone {
        RiskLevel::Extreme | RiskLevel::High => "High Alert",
        RiskLevel::Medium => "Elevated Alert",
        RiskLevel::Low => "Advisory",
        RiskLevel::NoRisk | RiskLevel::VeryLow => "All Clear",
    }
}

// ============================================================================
// Cross-event maximum
// ============================================================================

/// Keeps the highest level seen and the item that produced it.
///
/// Ties keep the earlier item.
#[derive(Debug, Clone)]
pub struct RiskTracker<T> {
    highest: Option<(RiskLevel, T)>,
}

impl<T> Default for RiskTracker<T> {
    fn default() -> Self {
        Self { highest: None }
    }
}

impl<T> RiskTracker<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, level: RiskLevel, item: T) {
        let replace = match &self.highest {
            Some((current, _)) => level > *current,
            None => true,
        };
        if replace {
            self.highest = Some((level, item));
        }
    }

    pub fn level(&self) -> Option<RiskLevel> {
        self.highest.as_ref().map(|(level, _)| *level)
    }

    pub fn into_highest(self) -> Option<(RiskLevel, T)> {
        self.highest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tables_are_ordered() {
        assert!(flood_table().is_ordered());
        assert!(tsunami_event_table().is_ordered());
    }

    #[test]
    fn test_flood_levels() {
        assert_eq!(flood_level(0.0), RiskLevel::VeryLow);
        assert_eq!(flood_level(0.2), RiskLevel::Low);
        assert_eq!(flood_level(0.4), RiskLevel::Medium);
        assert_eq!(flood_level(0.64), RiskLevel::High);
        assert_eq!(flood_level(0.639), RiskLevel::Medium);
        assert_eq!(flood_level(0.8), RiskLevel::Extreme);
        assert_eq!(flood_level(1.0), RiskLevel::Extreme);
    }

    #[test]
    fn test_tsunami_event_levels() {
        assert_eq!(tsunami_event_level(0.85), RiskLevel::High);
        assert_eq!(tsunami_event_level(0.3), RiskLevel::Medium);
        assert_eq!(tsunami_event_level(0.29), RiskLevel::Low);
    }

    #[test]
    fn test_tsunami_zones() {
        assert_eq!(tsunami_user_zone(0.9, false, 10.0), RiskLevel::NoRisk);
        assert_eq!(tsunami_user_zone(0.29, true, 10.0), RiskLevel::NoRisk);
        assert_eq!(tsunami_user_zone(0.7, true, 100.0), RiskLevel::High);
        assert_eq!(tsunami_user_zone(0.5, true, 50.0), RiskLevel::Medium);
        assert_eq!(tsunami_user_zone(0.8, true, 500.0), RiskLevel::Medium);
        assert_eq!(tsunami_user_zone(0.79, true, 300.0), RiskLevel::Low);
        assert_eq!(tsunami_user_zone(0.85, true, 709.0), RiskLevel::Low);
        assert_eq!(tsunami_user_zone(0.79, true, 900.0), RiskLevel::NoRisk);
        assert_eq!(tsunami_user_zone(1.0, true, 1000.1), RiskLevel::NoRisk);
    }

    #[test]
    fn test_overall_status() {
        assert_eq!(overall_status(RiskLevel::High), "High Alert");
        assert_eq!(overall_status(RiskLevel::Medium), "Elevated Alert");
        assert_eq!(overall_status(RiskLevel::Low), "Advisory");
        assert_eq!(overall_status(RiskLevel::NoRisk), "All Clear");
    }

    #[test]
    fn test_tracker_keeps_first_on_tie() {
        let mut tracker = RiskTracker::new();
        assert_eq!(tracker.level(), None);
        tracker.observe(RiskLevel::Low, "a");
        tracker.observe(RiskLevel::Medium, "b");
        tracker.observe(RiskLevel::Medium, "c");
        tracker.observe(RiskLevel::NoRisk, "d");
        assert_eq!(tracker.into_highest(), Some((RiskLevel::Medium, "b")));
    }

    fn any_level() -> impl Strategy<Value = RiskLevel> {
        prop_oneof![
            Just(RiskLevel::NoRisk),
            Just(RiskLevel::VeryLow),
            Just(RiskLevel::Low),
            Just(RiskLevel::Medium),
            Just(RiskLevel::High),
            Just(RiskLevel::Extreme),
        ]
    }

    proptest! {
        #[test]
        fn prop_close_likely_tsunami_never_no_risk(p in 0.64f64..=1.0, d in 0.0f64..=100.0) {
            let zone = tsunami_user_zone(p, true, d);
            prop_assert!(zone == RiskLevel::High || zone == RiskLevel::Medium);
        }

        #[test]
        fn prop_tracker_level_is_batch_max(levels in prop::collection::vec(any_level(), 1..40)) {
            let mut tracker = RiskTracker::new();
            for (i, level) in levels.iter().enumerate() {
                tracker.observe(*level, i);
            }
            let max_rank = levels.iter().map(RiskLevel::rank).max();
            prop_assert_eq!(tracker.level().map(|l| l.rank()), max_rank);
            let (level, idx) = tracker.into_highest().unwrap();
            // producer is the first event at the max rank
            let first = levels.iter().position(|l| l.rank() == level.rank()).unwrap();
            prop_assert_eq!(idx, first);
        }

        #[test]
        fn prop_zone_never_rises_with_distance(
            p in 0.0f64..=1.0, d1 in 0.0f64..=2000.0, extra in 0.0f64..=2000.0
        ) {
            prop_assert!(tsunami_user_zone(p, true, d1) >= tsunami_user_zone(p, true, d1 + extra));
        }
    }
}
