//! Last-known-good snapshot storage.
//!
//! The cache holds exactly one snapshot: the record set from the most recent
//! successful refresh and the time it was fetched. Every save replaces the
//! previous snapshot wholesale; nothing is merged or appended.
//!
//! ## Layout
//!
//! ```text
//! storage/
//! ├── config.toml           # Application configuration
//! └── last_quakes.json      # Snapshot: { fetched_at, count, records }
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};
use crate::models::{CacheConfig, EarthquakeRecord};

// Re-export for convenience
pub use local::LocalCache;
pub use memory::MemoryCache;

/// A persisted record set with its fetch time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSnapshot {
    /// When the records were fetched
    pub fetched_at: DateTime<Utc>,
    /// Record count, informational
    pub count: usize,
    /// Records in feed order
    pub records: Vec<EarthquakeRecord>,
}

impl CacheSnapshot {
    pub fn new(records: Vec<EarthquakeRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            fetched_at,
            count: records.len(),
            records,
        }
    }
}

/// Trait for snapshot storage backends.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Replace the stored snapshot.
    async fn save(&self, records: &[EarthquakeRecord], fetched_at: DateTime<Utc>) -> Result<()>;

    /// Read the stored snapshot, distinguishing "never saved" from "unreadable".
    async fn load_checked(&self) -> std::result::Result<CacheSnapshot, CacheError>;

    /// Read the stored snapshot; a corrupt snapshot reads as absent.
    async fn load(&self) -> Option<CacheSnapshot> {
        self.load_checked().await.ok()
    }
}

/// Build the cache backend selected by `[cache]`.
pub fn cache_from_config(config: &CacheConfig) -> Box<dyn CacheStore> {
    if config.in_memory {
        Box::new(MemoryCache::new())
    } else {
        Box::new(LocalCache::new(&config.path))
    }
}
