// src/services/fetcher.rs

//! Feed fetchers.
//!
//! A fetcher produces the raw fixed-width text or a [`FetchError`] value. It
//! never retries; the refresh timer is the retry mechanism.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{FetchError, Result};
use crate::models::{FeedConfig, FeedSource};
use crate::services::relay::{RelayResponse, UpstreamClient};
use crate::utils::http::create_async_client;

/// Source of raw feed text.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Retrieve the current feed text.
    async fn fetch(&self) -> std::result::Result<String, FetchError>;
}

/// Fetches through the same-origin relay endpoint.
#[derive(Debug, Clone)]
pub struct RelayFetcher {
    client: Client,
    url: String,
}

impl RelayFetcher {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Build from the `[feed]` configuration.
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        Ok(Self::new(create_async_client(config)?, &config.relay_url))
    }
}

#[async_trait]
impl FeedFetcher for RelayFetcher {
    async fn fetch(&self) -> std::result::Result<String, FetchError> {
        log::debug!("Requesting feed from relay {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<RelayResponse>(&body) {
            // A failure envelope names the upstream problem, whatever the status.
            Ok(envelope) if !envelope.success => Err(envelope
                .into_payload()
                .err()
                .unwrap_or_else(|| FetchError::upstream("relay reported failure", None))
                .with_status(status.as_u16())),
            _ if !status.is_success() => Err(FetchError::transport(
                Some(status.as_u16()),
                format!("relay responded with {status}"),
            )),
            Ok(envelope) => envelope.into_payload(),
            Err(e) => Err(FetchError::Decode(e.to_string())),
        }
    }
}

/// Fetches the upstream page directly, running the relay logic in-process.
#[derive(Debug, Clone)]
pub struct DirectFetcher {
    upstream: UpstreamClient,
}

impl DirectFetcher {
    pub fn new(upstream: UpstreamClient) -> Self {
        Self { upstream }
    }

    /// Build from the `[feed]` configuration.
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        Ok(Self::new(UpstreamClient::from_config(config)?))
    }
}

#[async_trait]
impl FeedFetcher for DirectFetcher {
    async fn fetch(&self) -> std::result::Result<String, FetchError> {
        self.upstream.fetch_payload().await
    }
}

/// Build the fetcher selected by `feed.source`.
pub fn fetcher_from_config(config: &FeedConfig) -> Result<Box<dyn FeedFetcher>> {
    Ok(match config.source {
        FeedSource::Relay => Box::new(RelayFetcher::from_config(config)?),
        FeedSource::Direct => Box::new(DirectFetcher::from_config(config)?),
    })
}
