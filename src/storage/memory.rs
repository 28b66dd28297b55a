//! In-process snapshot cache.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{CacheError, Result};
use crate::models::EarthquakeRecord;
use crate::storage::{CacheSnapshot, CacheStore};

/// Snapshot cache that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    snapshot: RwLock<Option<CacheSnapshot>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded cache.
    pub fn with_snapshot(snapshot: CacheSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn save(&self, records: &[EarthquakeRecord], fetched_at: DateTime<Utc>) -> Result<()> {
        let snapshot = CacheSnapshot::new(records.to_vec(), fetched_at);
        match self.snapshot.write() {
            Ok(mut slot) => *slot = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
        Ok(())
    }

    async fn load_checked(&self) -> std::result::Result<CacheSnapshot, CacheError> {
        let slot = self.snapshot.read().map_err(|_| CacheError::Corrupt)?;
        slot.clone().ok_or(CacheError::Miss)
    }
}
