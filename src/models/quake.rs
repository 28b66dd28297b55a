//! Earthquake record data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Placeholder the feed prints for a magnitude scale that was not reported.
pub const MAGNITUDE_PLACEHOLDER: &str = "-.-";

/// Component magnitudes reported by the feed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MagnitudeDetail {
    /// Duration magnitude (MD)
    pub md: Option<f64>,

    /// Local magnitude (ML)
    pub ml: Option<f64>,

    /// Moment magnitude (Mw)
    pub mw: Option<f64>,
}

impl MagnitudeDetail {
    /// Preferred magnitude: ML, then MD, then Mw.
    pub fn preferred(&self) -> Option<f64> {
        self.ml.or(self.md).or(self.mw)
    }
}

/// A single seismic event parsed from the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EarthquakeRecord {
    /// Event origin time, normalized to UTC
    pub occurred_at: DateTime<Utc>,

    /// Preferred magnitude (see [`MagnitudeDetail::preferred`])
    pub magnitude: f64,

    /// All component magnitudes as reported
    pub magnitude_detail: MagnitudeDetail,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Depth in kilometres; `None` when the feed leaves it blank
    pub depth_km: Option<f64>,

    /// Free-text place description
    pub location: String,
}

impl EarthquakeRecord {
    /// Stable identifier derived from origin time and epicentre.
    ///
    /// Revised solutions keep the same origin time and coordinates, so the id
    /// survives magnitude revisions between refreshes.
    pub fn id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.occurred_at.timestamp().to_be_bytes());
        hasher.update(format!("{:.4}", self.latitude).as_bytes());
        hasher.update(format!("{:.4}", self.longitude).as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..16].to_string()
    }

    /// Format the record for display using a template.
    ///
    /// Supported placeholders:
    /// - `{magnitude}`, `{location}`, `{time}`
    /// - `{lat}`, `{lng}`, `{depth}`
    pub fn format(&self, template: &str) -> String {
        let depth = self
            .depth_km
            .map(|d| format!("{d:.1}"))
            .unwrap_or_else(|| "?".to_string());
        template
            .replace("{magnitude}", &format!("{:.1}", self.magnitude))
            .replace("{location}", &self.location)
            .replace(
                "{time}",
                &self.occurred_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            )
            .replace("{lat}", &format!("{:.4}", self.latitude))
            .replace("{lng}", &format!("{:.4}", self.longitude))
            .replace("{depth}", &depth)
    }
}
