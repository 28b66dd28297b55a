// src/services/relay.rs

//! Upstream access and the relay JSON envelope.
//!
//! The relay fetches the institute's report page, normalizes its encoding,
//! strips control characters, and isolates the `<pre>` block holding the
//! fixed-width table. The same logic backs the `serve-relay` endpoint and the
//! in-process [`DirectFetcher`](crate::services::DirectFetcher).

use chrono::{Local, SecondsFormat};
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, Result};
use crate::models::FeedConfig;
use crate::utils::http::create_async_client;
use crate::utils::text::{decode_feed_bytes, strip_control_chars};

/// Number of payload lines echoed in the debug block.
const DEBUG_LINES: usize = 10;

/// JSON envelope returned by the relay endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayResponse {
    pub success: bool,

    /// Extracted feed text (success only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Free-form diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<serde_json::Value>,

    /// ISO-8601 time the relay produced this response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Short failure description (failure only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Failure detail, e.g. the upstream HTTP code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Diagnostics attached to a successful relay response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayDebug {
    pub first_lines: Vec<String>,
    pub total_lines: usize,
}

fn now_iso() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

impl RelayResponse {
    /// Successful envelope around extracted feed text.
    pub fn success(data: String) -> Self {
        let debug = RelayDebug {
            first_lines: data.lines().take(DEBUG_LINES).map(str::to_string).collect(),
            total_lines: data.lines().count(),
        };
        Self {
            success: true,
            data: Some(data),
            debug: serde_json::to_value(debug).ok(),
            timestamp: Some(now_iso()),
            error: None,
            details: None,
        }
    }

    /// Failure envelope.
    pub fn failure(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            debug: None,
            timestamp: Some(now_iso()),
            error: Some(error.into()),
            details,
        }
    }

    /// Failure envelope describing a fetch error.
    pub fn from_fetch_error(e: &FetchError) -> Self {
        let details = match e {
            FetchError::Transport {
                status: Some(code), ..
            } => format!("HTTP Code: {code}"),
            FetchError::Upstream {
                details: Some(d), ..
            } => d.clone(),
            other => other.to_string(),
        };
        Self::failure("Failed to fetch data", Some(details))
    }

    /// Convert the envelope into feed text or the failure it reports.
    pub fn into_payload(self) -> std::result::Result<String, FetchError> {
        if !self.success {
            return Err(FetchError::upstream(
                self.error
                    .unwrap_or_else(|| "relay reported failure".to_string()),
                self.details,
            ));
        }
        match self.data {
            Some(data) if !data.trim().is_empty() => Ok(data),
            _ => Err(FetchError::upstream("relay returned no data", None)),
        }
    }
}

/// Decode upstream bytes and drop control characters.
pub fn normalize(bytes: &[u8]) -> String {
    strip_control_chars(&decode_feed_bytes(bytes))
}

/// Isolate the tabular region of the report page.
///
/// The table lives in the page's `<pre>` element; a document without one is
/// returned whole.
pub fn extract_payload(document: &str) -> String {
    let pre = match Selector::parse("pre") {
        Ok(selector) => selector,
        Err(e) => {
            log::error!("Invalid <pre> selector: {e:?}");
            return document.trim().to_string();
        }
    };

    let html = Html::parse_document(document);
    match html.select(&pre).next() {
        Some(element) => element.text().collect::<String>().trim().to_string(),
        None => {
            log::warn!("No <pre> block in upstream page; relaying whole document");
            document.trim().to_string()
        }
    }
}

/// Client for the upstream report page.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    url: String,
}

impl UpstreamClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Build from the `[feed]` configuration.
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        Ok(Self::new(create_async_client(config)?, &config.upstream_url))
    }

    /// Fetch the report page and return the normalized table text.
    pub async fn fetch_payload(&self) -> std::result::Result<String, FetchError> {
        log::debug!("Fetching upstream feed from {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Upstream responded with HTTP {}", status.as_u16());
            return Err(FetchError::transport(
                Some(status.as_u16()),
                format!("upstream responded with {status}"),
            ));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(FetchError::transport(
                Some(status.as_u16()),
                "upstream returned an empty body",
            ));
        }

        let payload = extract_payload(&normalize(&bytes));
        log::debug!("Extracted {} feed lines", payload.lines().count());
        Ok(payload)
    }

    /// Fetch and wrap the result in the relay envelope.
    pub async fn relay_response(&self) -> RelayResponse {
        match self.fetch_payload().await {
            Ok(data) => RelayResponse::success(data),
            Err(e) => {
                log::error!("Relay fetch failed: {e}");
                RelayResponse::from_fetch_error(&e)
            }
        }
    }
}
