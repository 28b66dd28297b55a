//! Service layer for the earthquake tracker.
//!
//! This module contains the business logic for:
//! - Feed retrieval through the relay or directly (`FeedFetcher`)
//! - Fixed-width report parsing (`FeedParser`)
//! - The relay envelope and upstream access (`RelayResponse`, `UpstreamClient`)
//! - Presentation (`Notifier`)

mod fetcher;
mod notifier;
mod parser;
pub mod relay;

pub use fetcher::{DirectFetcher, FeedFetcher, RelayFetcher, fetcher_from_config};
pub use notifier::{ConsoleNotifier, Level, Notifier};
pub use parser::{DATE_TOKEN, FeedParser, LineError, MAGNITUDE_TOKEN, locate_data_start};
pub use relay::{RelayResponse, UpstreamClient};
