// src/error.rs

//! Unified error handling for the earthquake tracker.

use std::fmt;

use thiserror::Error;

/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Feed could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Refresh produced neither fresh nor cached data
    #[error("refresh failed: {0}")]
    Refresh(#[from] RefreshFailure),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Failure to obtain raw feed text.
///
/// Returned as a value by every [`FeedFetcher`](crate::services::FeedFetcher);
/// the refresh controller decides what to do with it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network failure or non-success HTTP status reaching the relay/upstream.
    #[error("transport error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The relay was reached but reported that the upstream provider failed.
    #[error("upstream error: {message}{}", details.as_ref().map(|d| format!(" ({d})")).unwrap_or_default())]
    Upstream {
        status: Option<u16>,
        message: String,
        details: Option<String>,
    },

    /// The relay answered with a body that is not the expected envelope.
    #[error("malformed relay response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Create a transport error, optionally carrying an HTTP status code.
    pub fn transport(status: Option<u16>, message: impl fmt::Display) -> Self {
        Self::Transport {
            status,
            message: message.to_string(),
        }
    }

    /// Create an upstream error.
    pub fn upstream(message: impl Into<String>, details: Option<String>) -> Self {
        Self::Upstream {
            status: None,
            message: message.into(),
            details,
        }
    }

    /// Attach the HTTP status the relay answered with.
    pub fn with_status(self, code: u16) -> Self {
        match self {
            Self::Transport { message, .. } => Self::Transport {
                status: Some(code),
                message,
            },
            Self::Upstream {
                message, details, ..
            } => Self::Upstream {
                status: Some(code),
                message,
                details,
            },
            other => other,
        }
    }

    /// HTTP status code associated with this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } | Self::Upstream { status, .. } => *status,
            Self::Decode(_) => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        if e.is_decode() {
            return Self::Decode(e.to_string());
        }
        Self::transport(status, e)
    }
}

/// Why a refresh cycle could not publish fresh data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    /// Network/HTTP failure reaching the relay.
    #[error("{0}")]
    Transport(FetchError),

    /// Relay reached but the upstream provider failed.
    #[error("{0}")]
    Upstream(FetchError),

    /// Fetch succeeded but parsing yielded zero records.
    #[error("feed parsed to zero records (format mismatch?)")]
    Format,
}

impl From<FetchError> for RefreshFailure {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Upstream { .. } => Self::Upstream(e),
            FetchError::Transport { .. } | FetchError::Decode(_) => Self::Transport(e),
        }
    }
}

/// Outcome of reading the cache during fallback.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// Nothing has ever been saved.
    #[error("no cached data available")]
    Miss,

    /// A snapshot exists but could not be read back.
    #[error("cached data is unreadable")]
    Corrupt,
}
