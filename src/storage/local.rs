//! Local filesystem snapshot cache.
//!
//! The snapshot is a single JSON document written to a temporary sibling file
//! and renamed over the previous one, so readers see either the old or the new
//! snapshot and never a partial write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::error::{CacheError, Result};
use crate::models::EarthquakeRecord;
use crate::storage::{CacheSnapshot, CacheStore};

/// Snapshot cache backed by one JSON file.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    /// Create a cache stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> std::io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl CacheStore for LocalCache {
    async fn save(&self, records: &[EarthquakeRecord], fetched_at: DateTime<Utc>) -> Result<()> {
        let snapshot = CacheSnapshot::new(records.to_vec(), fetched_at);
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        self.write_bytes(&bytes).await?;
        log::debug!(
            "Cached {} records to {}",
            snapshot.count,
            self.path.display()
        );
        Ok(())
    }

    async fn load_checked(&self) -> std::result::Result<CacheSnapshot, CacheError> {
        let bytes = match self.read_bytes().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Err(CacheError::Miss),
            Err(e) => {
                log::warn!("Failed to read cache {}: {}", self.path.display(), e);
                return Err(CacheError::Corrupt);
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            log::warn!("Ignoring corrupt cache {}: {}", self.path.display(), e);
            CacheError::Corrupt
        })
    }
}
