//! User-defined watch zones.

use serde::{Deserialize, Serialize};

use crate::models::EarthquakeRecord;
use crate::utils::geo::distance_km;

/// A circular area the user wants to watch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserZone {
    /// Display name
    pub name: String,

    /// Centre latitude in degrees
    pub lat: f64,

    /// Centre longitude in degrees
    pub lng: f64,

    /// Radius in kilometres
    pub radius_km: f64,
}

impl UserZone {
    /// Distance from the zone centre to the event epicentre.
    pub fn distance_to(&self, record: &EarthquakeRecord) -> f64 {
        distance_km(self.lat, self.lng, record.latitude, record.longitude)
    }

    /// Whether the epicentre falls inside this zone.
    pub fn contains(&self, record: &EarthquakeRecord) -> bool {
        self.distance_to(record) <= self.radius_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MagnitudeDetail;
    use chrono::Utc;

    fn record_at(lat: f64, lng: f64) -> EarthquakeRecord {
        EarthquakeRecord {
            occurred_at: Utc::now(),
            magnitude: 2.0,
            magnitude_detail: MagnitudeDetail {
                md: Some(2.0),
                ml: None,
                mw: None,
            },
            latitude: lat,
            longitude: lng,
            depth_km: None,
            location: "TEST".to_string(),
        }
    }

    #[test]
    fn test_contains() {
        let izmir = UserZone {
            name: "Izmir".to_string(),
            lat: 38.42,
            lng: 27.14,
            radius_km: 75.0,
        };

        assert!(izmir.contains(&record_at(38.1234, 27.5678)));
        // Istanbul is roughly 330 km away
        assert!(!izmir.contains(&record_at(41.01, 28.98)));
    }
}
