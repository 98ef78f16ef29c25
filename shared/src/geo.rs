//! Geographic primitives: great-circle distance and land/ocean heuristics

use crate::types::Coordinates;

/// Mean Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Continental bounding boxes as (min_lat, max_lat, min_lon, max_lon)
pub const CONTINENTAL_REGIONS: [(f64, f64, f64, f64); 5] = [
    (25.0, 70.0, -160.0, -50.0), // North America
    (35.0, 75.0, -10.0, 180.0),  // Europe/Asia
    (-35.0, 35.0, -20.0, 55.0),  // Africa
    (-45.0, -10.0, 110.0, 155.0), // Australia
    (-55.0, 15.0, -85.0, -30.0), // South America
];

/// Great-circle distance between two points in km (haversine)
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // rounding can push h a hair outside [0, 1] for antipodal points
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    (EARTH_RADIUS_KM * c).max(0.0)
}

/// True when the point lies outside every continental bounding box
pub fn is_oceanic(latitude: f64, longitude: f64) -> bool {
    !CONTINENTAL_REGIONS
        .iter()
        .any(|&(min_lat, max_lat, min_lon, max_lon)| {
            (min_lat..=max_lat).contains(&latitude) && (min_lon..=max_lon).contains(&longitude)
        })
}

/// Climate band used by the rainfall baseline and cyclone geography
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateBand {
    Tropical,
    Subtropical,
    Temperate,
}

impl ClimateBand {
    /// Tropical below 23.5°, subtropical below 40°, temperate otherwise
    pub fn from_latitude(latitude: f64) -> Self {
        let abs_lat = latitude.abs();
        if abs_lat < 23.5 {
            ClimateBand::Tropical
        } else if abs_lat < 40.0 {
            ClimateBand::Subtropical
        } else {
            ClimateBand::Temperate
        }
    }
}
