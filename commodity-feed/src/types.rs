use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One feed item as decoded, before cleanup. Dates are already offset-stripped
/// wall-clock instants (see `dates::parse_timestamp`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub published: Option<NaiveDateTime>,
    pub updated: Option<NaiveDateTime>,
}

/// An entry after date normalization and text cleanup. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub title: String,
    /// Canonical link: query string and fragment removed.
    pub link: String,
    pub summary: String,
    pub source: String,
    /// Sort key. `NaiveDateTime::MIN` when no date could be parsed under the oldest-fallback policy.
    pub published_at: NaiveDateTime,
    pub display_date: String,
}

/// Result of retrieving one source. Failures are data, never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched { body: Vec<u8>, http_status: u16 },
    Failed { reason: String },
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }
}

/// Relevant items produced by one source, in feed order.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: String,
    pub ok: bool,
    pub items: Vec<NormalizedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
                .to_string(),
            accept: "application/rss+xml, text/xml;q=0.9, */*;q=0.8".to_string(),
            timeout_seconds: 20,
            // Retries would stretch a dead source past its own timeout.
            max_retries: 0,
            retry_delay_seconds: 2,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
