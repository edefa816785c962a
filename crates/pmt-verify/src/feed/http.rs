//! HTTP transport for the key feed: status mapping and retry.
//!
//! This is the only place that interprets status codes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, RETRY_AFTER, USER_AGENT};
use tracing::{debug, warn};

use crate::config::KeyFeedConfig;
use crate::error::{ConfigError, FetchError, FetchResult};

use super::helpers::parse_max_age;
use super::{FeedTransport, FetchedFeed};

const USER_AGENT_VALUE: &str = concat!("pmt-verify/", env!("CARGO_PKG_VERSION"));

/// Longest backoff between retries.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// reqwest-backed [`FeedTransport`].
#[derive(Debug, Clone)]
pub struct HttpFeedTransport {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpFeedTransport {
    pub fn new(config: &KeyFeedConfig) -> Result<Self, ConfigError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ConfigError::HttpClient {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
        })
    }

    async fn get_once(&self, url: &str) -> FetchResult<FetchedFeed> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => {
                let max_age = parse_max_age(
                    response
                        .headers()
                        .get(CACHE_CONTROL)
                        .and_then(|v| v.to_str().ok()),
                );
                let body = response.bytes().await.map_err(|e| FetchError::Network {
                    message: format!("failed to read response body: {}", e),
                })?;

                Ok(FetchedFeed {
                    body: body.to_vec(),
                    max_age,
                })
            }

            429 => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);

                Err(FetchError::RateLimited { retry_after })
            }

            code => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(FetchError::Status {
                    status: code,
                    message: message.chars().take(200).collect(),
                })
            }
        }
    }
}

#[async_trait]
impl FeedTransport for HttpFeedTransport {
    async fn get(&self, url: &str) -> FetchResult<FetchedFeed> {
        let mut retries = 0;

        loop {
            match self.get_once(url).await {
                Ok(feed) => {
                    debug!(
                        url = %url,
                        bytes = feed.body.len(),
                        max_age_secs = feed.max_age.as_secs(),
                        "fetched key feed"
                    );
                    return Ok(feed);
                }
                Err(e) if e.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let backoff = backoff_for(&e, retries);

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying key feed request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Jittered delay before retry number `retries` (1-based).
fn backoff_for(error: &FetchError, retries: u32) -> Duration {
    use rand::Rng;

    match error {
        FetchError::RateLimited {
            retry_after: Some(retry_after),
        } => {
            let base_ms = (*retry_after).min(MAX_BACKOFF).as_millis() as u64;
            let jitter_factor: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
            Duration::from_millis(jittered_ms.max(100))
        }
        _ => {
            let base_backoff = Duration::from_secs(1 << retries.min(5)).min(MAX_BACKOFF);
            let jittered_ms = rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
            Duration::from_millis(jittered_ms.max(10))
        }
    }
}
