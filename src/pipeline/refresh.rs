//! Refresh controller.
//!
//! Orchestrates fetch → parse → cache → publish. The controller is the only
//! place that decides whether a failure falls back to the cached snapshot or
//! surfaces as an error notification.
//!
//! ## States
//!
//! ```text
//!          trigger (timer/manual)
//!   Idle ─────────────────────────▶ Refreshing
//!    ▲                                  │
//!    └──────── every exit path ─────────┘
//! ```
//!
//! A trigger that arrives while `Refreshing` is dropped, not queued.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::error::{CacheError, RefreshFailure, Result};
use crate::models::{Config, EarthquakeRecord};
use crate::pipeline::diff::calculate_diff;
use crate::services::{FeedFetcher, FeedParser, Level, Notifier, fetcher_from_config};
use crate::storage::{CacheStore, cache_from_config};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Result of one refresh trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Another cycle was in flight; nothing happened
    Skipped,
    /// Fresh records were parsed, cached and published
    Updated {
        count: usize,
        new: usize,
        removed: usize,
    },
    /// Fresh data unavailable; cached records were published
    Stale {
        count: usize,
        cached_at: DateTime<Utc>,
        cause: RefreshFailure,
    },
    /// Fresh data unavailable and nothing usable was cached
    Failed {
        cause: RefreshFailure,
        cache: CacheError,
    },
}

/// Marks a cycle in flight; returns the controller to `Idle` when dropped.
struct InFlight<'a> {
    state: &'a Mutex<RefreshState>,
    notifier: &'a dyn Notifier,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = RefreshState::Idle;
        self.notifier.progress(false);
    }
}

/// Owns the refresh pipeline and the currently published records.
pub struct RefreshController {
    fetcher: Arc<dyn FeedFetcher>,
    parser: FeedParser,
    cache: Arc<dyn CacheStore>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<RefreshState>,
    current: RwLock<Vec<EarthquakeRecord>>,
}

impl RefreshController {
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        parser: FeedParser,
        cache: Arc<dyn CacheStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            fetcher,
            parser,
            cache,
            notifier,
            state: Mutex::new(RefreshState::Idle),
            current: RwLock::new(Vec::new()),
        }
    }

    /// Wire the configured fetcher, parser and cache to `notifier`.
    pub fn from_config(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let fetcher: Arc<dyn FeedFetcher> = fetcher_from_config(&config.feed)?.into();
        let cache: Arc<dyn CacheStore> = cache_from_config(&config.cache).into();
        let parser = FeedParser::from_config(config)?;
        Ok(Self::new(fetcher, parser, cache, notifier))
    }

    /// Current state.
    pub fn state(&self) -> RefreshState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records most recently published.
    pub fn current_records(&self) -> Vec<EarthquakeRecord> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Move `Idle → Refreshing`, or `None` if a cycle is already running.
    fn try_begin(&self) -> Option<InFlight<'_>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == RefreshState::Refreshing {
            return None;
        }
        *state = RefreshState::Refreshing;
        drop(state);

        self.notifier.progress(true);
        Some(InFlight {
            state: &self.state,
            notifier: self.notifier.as_ref(),
        })
    }

    /// Run one refresh cycle unless one is already in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_in_flight) = self.try_begin() else {
            log::debug!("Refresh already in progress; trigger dropped");
            return RefreshOutcome::Skipped;
        };

        match self.fetch_and_parse().await {
            Ok(records) => self.publish_fresh(records).await,
            Err(cause) => self.fall_back(cause).await,
        }
    }

    async fn fetch_and_parse(&self) -> std::result::Result<Vec<EarthquakeRecord>, RefreshFailure> {
        let raw = self.fetcher.fetch().await.map_err(|e| {
            log::warn!("Feed fetch failed: {e}");
            RefreshFailure::from(e)
        })?;

        let records = self.parser.parse(&raw);
        if records.is_empty() {
            log::warn!(
                "Feed fetched ({} bytes) but no records parsed",
                raw.len()
            );
            return Err(RefreshFailure::Format);
        }
        Ok(records)
    }

    async fn publish_fresh(&self, records: Vec<EarthquakeRecord>) -> RefreshOutcome {
        let fetched_at = Utc::now();
        if let Err(e) = self.cache.save(&records, fetched_at).await {
            log::warn!("Failed to cache {} records: {}", records.len(), e);
        }

        let diff = calculate_diff(&self.current_records(), &records);
        let count = records.len();
        let new = diff.added.len();
        let removed = diff.removed.len();

        self.notifier.publish(&records);
        self.notifier.notify(
            &format!("Data updated successfully. Found {count} earthquakes ({new} new)."),
            Level::Success,
        );
        if diff.has_changes() {
            log::info!(
                "Refresh complete: {} records, {} new, {} rolled off",
                count,
                new,
                removed
            );
        } else {
            log::info!("Refresh complete: {} records, unchanged", count);
        }

        self.set_current(records);
        RefreshOutcome::Updated {
            count,
            new,
            removed,
        }
    }

    async fn fall_back(&self, cause: RefreshFailure) -> RefreshOutcome {
        match self.cache.load_checked().await {
            Ok(snapshot) => {
                let count = snapshot.records.len();
                let cached_at = snapshot.fetched_at;

                self.notifier.publish(&snapshot.records);
                self.notifier.notify(
                    &format!(
                        "Using cached data. Last update: {}",
                        cached_at.format("%Y-%m-%d %H:%M:%S UTC")
                    ),
                    Level::Warning,
                );
                log::warn!(
                    "Serving {} cached records from {} ({})",
                    count,
                    cached_at.to_rfc3339(),
                    cause
                );

                self.set_current(snapshot.records);
                RefreshOutcome::Stale {
                    count,
                    cached_at,
                    cause,
                }
            }
            Err(cache) => {
                self.notifier.notify(
                    "Failed to load earthquake data. Please try again later.",
                    Level::Error,
                );
                log::error!("Refresh failed ({cause}) and {cache}");
                RefreshOutcome::Failed { cause, cache }
            }
        }
    }

    fn set_current(&self, records: Vec<EarthquakeRecord>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = records;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::pipeline::testing::{EXAMPLE_FEED, RecordingNotifier, StubFetcher, sample_records};
    use crate::storage::{CacheSnapshot, MemoryCache};
    use chrono::TimeZone;

    fn controller(
        fetcher: Arc<StubFetcher>,
        cache: Arc<MemoryCache>,
        notifier: Arc<RecordingNotifier>,
    ) -> RefreshController {
        RefreshController::new(fetcher, FeedParser::default(), cache, notifier)
    }

    #[tokio::test]
    async fn test_success_caches_and_publishes() {
        let fetcher = Arc::new(StubFetcher::always(Ok(EXAMPLE_FEED.to_string())));
        let cache = Arc::new(MemoryCache::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let c = controller(fetcher.clone(), cache.clone(), notifier.clone());

        let outcome = c.refresh().await;

        assert_eq!(
            outcome,
            RefreshOutcome::Updated {
                count: 2,
                new: 2,
                removed: 0
            }
        );
        assert_eq!(cache.load().await.unwrap().records.len(), 2);
        assert_eq!(notifier.published().len(), 1);
        assert_eq!(notifier.published()[0][0].location, "IZMIR KORFEZI");
        let (message, level) = notifier.last_message().unwrap();
        assert_eq!(level, Level::Success);
        assert!(message.contains("Found 2 earthquakes"));
        assert_eq!(c.state(), RefreshState::Idle);
        assert_eq!(c.current_records().len(), 2);
    }

    #[tokio::test]
    async fn test_second_success_reports_no_new() {
        let fetcher = Arc::new(StubFetcher::always(Ok(EXAMPLE_FEED.to_string())));
        let c = controller(
            fetcher,
            Arc::new(MemoryCache::new()),
            Arc::new(RecordingNotifier::default()),
        );

        c.refresh().await;
        assert_eq!(
            c.refresh().await,
            RefreshOutcome::Updated {
                count: 2,
                new: 0,
                removed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_rolled_off_records_reported() {
        let shifted = EXAMPLE_FEED.replace("13:02:40", "13:30:00");
        let fetcher = Arc::new(StubFetcher::sequence(vec![
            Ok(EXAMPLE_FEED.to_string()),
            Ok(shifted),
        ]));
        let c = controller(
            fetcher,
            Arc::new(MemoryCache::new()),
            Arc::new(RecordingNotifier::default()),
        );

        c.refresh().await;
        assert_eq!(
            c.refresh().await,
            RefreshOutcome::Updated {
                count: 2,
                new: 1,
                removed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_concurrent_triggers_fetch_once() {
        let fetcher = Arc::new(StubFetcher::always(Ok(EXAMPLE_FEED.to_string())).yielding());
        let c = controller(
            fetcher.clone(),
            Arc::new(MemoryCache::new()),
            Arc::new(RecordingNotifier::default()),
        );

        let (a, b) = tokio::join!(c.refresh(), c.refresh());

        assert!(matches!(a, RefreshOutcome::Updated { .. }));
        assert_eq!(b, RefreshOutcome::Skipped);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(c.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_fetch_failure_uses_cache() {
        let cached_at = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let cache = Arc::new(MemoryCache::with_snapshot(CacheSnapshot::new(
            sample_records(),
            cached_at,
        )));
        let fetcher = Arc::new(StubFetcher::always(Err(FetchError::transport(
            Some(502),
            "bad gateway",
        ))));
        let notifier = Arc::new(RecordingNotifier::default());
        let c = controller(fetcher, cache, notifier.clone());

        let outcome = c.refresh().await;

        assert!(matches!(
            outcome,
            RefreshOutcome::Stale { count: 2, cause: RefreshFailure::Transport(_), .. }
        ));
        assert_eq!(notifier.published(), vec![sample_records()]);
        let (message, level) = notifier.last_message().unwrap();
        assert_eq!(level, Level::Warning);
        assert!(message.contains("2024-03-15 12:00:00 UTC"));
        assert_eq!(c.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_fetch_failure_without_cache_is_error() {
        let fetcher = Arc::new(StubFetcher::always(Err(FetchError::upstream(
            "Failed to fetch data",
            None,
        ))));
        let notifier = Arc::new(RecordingNotifier::default());
        let c = controller(fetcher, Arc::new(MemoryCache::new()), notifier.clone());

        let outcome = c.refresh().await;

        assert!(matches!(
            outcome,
            RefreshOutcome::Failed {
                cause: RefreshFailure::Upstream(_),
                cache: CacheError::Miss
            }
        ));
        assert!(notifier.published().is_empty());
        assert_eq!(notifier.last_message().unwrap().1, Level::Error);
        assert_eq!(c.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_zero_records_treated_as_failure() {
        let fetcher = Arc::new(StubFetcher::always(Ok("<html>maintenance</html>".to_string())));
        let cached_at = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let cache = Arc::new(MemoryCache::with_snapshot(CacheSnapshot::new(
            sample_records(),
            cached_at,
        )));
        let notifier = Arc::new(RecordingNotifier::default());
        let c = controller(fetcher, cache.clone(), notifier.clone());

        let outcome = c.refresh().await;

        assert!(matches!(
            outcome,
            RefreshOutcome::Stale { cause: RefreshFailure::Format, .. }
        ));
        // The snapshot was not overwritten by the empty parse.
        assert_eq!(cache.load().await.unwrap().fetched_at, cached_at);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_records() {
        let fetcher = Arc::new(StubFetcher::sequence(vec![
            Ok(EXAMPLE_FEED.to_string()),
            Err(FetchError::transport(None, "timeout")),
        ]));
        let notifier = Arc::new(RecordingNotifier::default());
        let c = controller(fetcher, Arc::new(MemoryCache::new()), notifier.clone());

        c.refresh().await;
        // Cache was filled by the first cycle, so the second serves it.
        let outcome = c.refresh().await;
        assert!(matches!(outcome, RefreshOutcome::Stale { count: 2, .. }));
        assert_eq!(c.current_records().len(), 2);
    }

    #[tokio::test]
    async fn test_progress_indicator_cleared() {
        let fetcher = Arc::new(StubFetcher::always(Err(FetchError::transport(None, "down"))));
        let notifier = Arc::new(RecordingNotifier::default());
        let c = controller(fetcher, Arc::new(MemoryCache::new()), notifier.clone());

        c.refresh().await;
        assert_eq!(notifier.progress_events(), vec![true, false]);
    }
}
