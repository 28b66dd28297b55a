// src/utils/geo.rs

//! Great-circle distance helpers.

use geo::{HaversineDistance, point};

/// Haversine distance in kilometres between two points given in degrees.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let a = point!(x: lng1, y: lat1);
    let b = point!(x: lng2, y: lat2);
    a.haversine_distance(&b) / 1000.0
}
