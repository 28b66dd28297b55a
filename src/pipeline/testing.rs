//! Fakes shared by the pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::EarthquakeRecord;
use crate::services::{FeedFetcher, FeedParser, Level, Notifier};

/// A two-event report in the institute's layout.
pub const EXAMPLE_FEED: &str = concat!(
    "<pre>\n",
    "                                                Büyüklük\n",
    "Tarih      Saat      Enlem(N) Boylam(E) Der(km) MD   ML   Mw   Yer\n",
    "---------- -------- -------- -------- ------ ---- ---- ---- -------------\n",
    "2024.03.15 14:23:11  38.1234  27.5678   7.3 -.-  3.2 -.-      IZMIR KORFEZI\n",
    "2024.03.15 13:02:40  37.0500  36.9000   10.2 2.4 -.- -.-      PAZARCIK (KAHRAMANMARAS)\n",
    "</pre>\n",
);

pub fn sample_records() -> Vec<EarthquakeRecord> {
    FeedParser::default().parse(EXAMPLE_FEED)
}

/// Fetcher that replays canned responses and counts calls.
pub struct StubFetcher {
    responses: Mutex<VecDeque<Result<String, FetchError>>>,
    fallback: Result<String, FetchError>,
    calls: AtomicUsize,
    yielding: bool,
}

impl StubFetcher {
    /// Same response for every call.
    pub fn always(response: Result<String, FetchError>) -> Self {
        Self::sequence(vec![]).with_fallback(response)
    }

    /// Responses in order; the last one repeats.
    pub fn sequence(responses: Vec<Result<String, FetchError>>) -> Self {
        let fallback = responses
            .last()
            .cloned()
            .unwrap_or_else(|| Err(FetchError::transport(None, "no response")));
        Self {
            responses: Mutex::new(responses.into()),
            fallback,
            calls: AtomicUsize::new(0),
            yielding: false,
        }
    }

    fn with_fallback(mut self, response: Result<String, FetchError>) -> Self {
        self.fallback = response;
        self
    }

    /// Yield to the runtime once before answering.
    pub fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for StubFetcher {
    async fn fetch(&self) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.yielding {
            tokio::task::yield_now().await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Notifier that records everything it is told.
#[derive(Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<Vec<EarthquakeRecord>>>,
    messages: Mutex<Vec<(String, Level)>>,
    progress: Mutex<Vec<bool>>,
}

impl RecordingNotifier {
    pub fn published(&self) -> Vec<Vec<EarthquakeRecord>> {
        self.published.lock().unwrap().clone()
    }

    pub fn last_message(&self) -> Option<(String, Level)> {
        self.messages.lock().unwrap().last().cloned()
    }

    pub fn progress_events(&self) -> Vec<bool> {
        self.progress.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&self, records: &[EarthquakeRecord]) {
        self.published.lock().unwrap().push(records.to_vec());
    }

    fn notify(&self, message: &str, level: Level) {
        self.messages.lock().unwrap().push((message.to_string(), level));
    }

    fn progress(&self, active: bool) {
        self.progress.lock().unwrap().push(active);
    }
}
