use crate::sources::Source;
use crate::traits::FeedRetriever;
use crate::types::{AggregatorError, FetchConfig, FetchOutcome, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// HTTP retriever. One shared client, one GET per source per attempt.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let accept = HeaderValue::from_str(&config.accept)
            .map_err(|e| AggregatorError::Config(format!("invalid Accept header: {}", e)))?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, accept);

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch one source. Never returns an error; see [`FeedRetriever`].
    #[instrument(skip(self, source), fields(source = %source.name))]
    pub async fn fetch_source(&self, source: &Source) -> FetchOutcome {
        let start_time = Instant::now();

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(&source.url).await {
                Ok(outcome) => {
                    if let FetchOutcome::Fetched { body, http_status } = &outcome {
                        debug!(
                            status = *http_status,
                            bytes = body.len(),
                            elapsed_ms = start_time.elapsed().as_millis() as u64,
                            "fetched feed"
                        );
                    }
                    return outcome;
                }
                Err(e) => {
                    let retryable = is_retryable(&e);
                    last_error = Some(e);

                    if retryable && attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(
                                source = %source.name,
                                "attempt {} failed, retrying in {:?}",
                                attempt + 1,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    break;
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        warn!(source = %source.name, url = %source.url, %reason, "feed fetch failed");
        FetchOutcome::Failed { reason }
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchOutcome> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AggregatorError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let limit = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit {
                return Ok(FetchOutcome::Failed {
                    reason: format!(
                        "feed too large: {}MB",
                        content_length as usize / (1024 * 1024)
                    ),
                });
            }
        }

        let body = response.bytes().await?;
        if body.len() > limit {
            return Ok(FetchOutcome::Failed {
                reason: format!("feed too large: {}MB", body.len() / (1024 * 1024)),
            });
        }

        Ok(FetchOutcome::Fetched {
            body: body.to_vec(),
            http_status: status.as_u16(),
        })
    }
}

#[async_trait]
impl FeedRetriever for Fetcher {
    async fn fetch(&self, source: &Source) -> FetchOutcome {
        self.fetch_source(source).await
    }
}

/// Client errors will not change on retry; everything else might.
fn is_retryable(error: &AggregatorError) -> bool {
    match error {
        AggregatorError::HttpStatus { status } => *status >= 500 || *status == 429,
        AggregatorError::Http(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_from_default_config() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        assert_eq!(fetcher.config().timeout_seconds, 20);
        assert_eq!(fetcher.config().max_retries, 0);
    }

    #[test]
    fn rejects_unencodable_accept_header() {
        let config = FetchConfig {
            accept: "text/xml\n".to_string(),
            ..Default::default()
        };
        assert!(matches!(Fetcher::new(config), Err(AggregatorError::Config(_))));
    }

    #[test]
    fn retry_policy() {
        assert!(is_retryable(&AggregatorError::HttpStatus { status: 503 }));
        assert!(is_retryable(&AggregatorError::HttpStatus { status: 429 }));
        assert!(!is_retryable(&AggregatorError::HttpStatus { status: 404 }));
        assert!(!is_retryable(&AggregatorError::Parse("x".into())));
    }

    #[tokio::test]
    async fn unreachable_source_is_a_failed_outcome() {
        let fetcher = Fetcher::new(FetchConfig {
            timeout_seconds: 2,
            ..Default::default()
        })
        .unwrap();
        // Port 9 on loopback: connection refused, no network needed.
        let source = Source::new("Dead", "http://127.0.0.1:9/feed");
        let outcome = fetcher.fetch(&source).await;
        assert!(!outcome.is_ok());
    }

    #[tokio::test]
    async fn stalled_source_is_cut_off_by_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold connections without ever answering.
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let fetcher = Fetcher::new(FetchConfig {
            timeout_seconds: 1,
            ..Default::default()
        })
        .unwrap();
        let source = Source::new("Stalled", format!("http://{}/feed", addr));

        let started = Instant::now();
        let outcome = tokio::time::timeout(Duration::from_secs(10), fetcher.fetch(&source))
            .await
            .expect("fetch should give up on its own");
        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }
}
