// src/models/mod.rs

//! Domain models for the earthquake tracker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod layout;
mod quake;
mod zone;

// Re-export all public types
pub use config::{
    CacheConfig, Config, DisplayConfig, FeedConfig, FeedSource, Observer, ParserConfig,
    RefreshConfig, RelayConfig,
};
pub use layout::{Column, ColumnLayout};
pub use quake::{EarthquakeRecord, MAGNITUDE_PLACEHOLDER, MagnitudeDetail};
pub use zone::UserZone;
