//! Stale-while-revalidate cache over a [`FeedTransport`].
//!
//! # Freshness
//!
//! With `age` the time since the entry was fetched and `max_age` the
//! server-declared lifetime:
//!
//! | age | behavior |
//! |-----|----------|
//! | `<= max_age / 2` | serve cached bytes |
//! | `<= max_age` | serve cached bytes, refresh in the background |
//! | `> max_age`, no entry, or `max_age == 0` | fetch before returning |
//!
//! # Locking
//!
//! `state` guards the entry and is never held across I/O. `refresh_lock`
//! admits one network fetch at a time: background refreshes skip when it is
//! taken, blocking fetches wait on it and then re-check the entry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::KeyFeedConfig;
use crate::error::{ConfigError, FetchResult};

use super::helpers::validate_endpoint;
use super::http::HttpFeedTransport;
use super::{FeedTransport, KeyFeedFetcher};

/// Caching [`KeyFeedFetcher`] for one endpoint.
#[derive(Clone)]
pub struct KeyFeedCache {
    shared: Arc<Shared>,
}

struct Shared {
    url: String,
    transport: Arc<dyn FeedTransport>,
    state: RwLock<Option<CacheEntry>>,
    refresh_lock: Arc<Mutex<()>>,
}

#[derive(Clone)]
struct CacheEntry {
    body: Arc<[u8]>,
    fetched_at: Instant,
    max_age: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    Fresh,
    Stale,
    Expired,
}

impl CacheEntry {
    fn freshness(&self, now: Instant) -> Freshness {
        let age = now.saturating_duration_since(self.fetched_at);
        if self.max_age.is_zero() || age > self.max_age {
            Freshness::Expired
        } else if age > self.max_age / 2 {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }
}

impl KeyFeedCache {
    /// Create a cache for `url`. Fails unless `url` is https.
    pub fn new(url: &str, transport: Arc<dyn FeedTransport>) -> Result<Self, ConfigError> {
        validate_endpoint(url)?;

        Ok(Self {
            shared: Arc::new(Shared {
                url: url.to_string(),
                transport,
                state: RwLock::new(None),
                refresh_lock: Arc::new(Mutex::new(())),
            }),
        })
    }

    /// Cache over an [`HttpFeedTransport`] built from `config`.
    pub fn from_config(config: &KeyFeedConfig) -> Result<Self, ConfigError> {
        let transport = HttpFeedTransport::new(config)?;
        Self::new(&config.url, Arc::new(transport))
    }

    /// The key feed endpoint this cache fetches from.
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    async fn snapshot(&self) -> Option<CacheEntry> {
        self.shared.state.read().await.clone()
    }

    /// Start a refresh unless one is already in flight. Never waits.
    fn spawn_refresh(&self) {
        let Ok(guard) = Arc::clone(&self.shared.refresh_lock).try_lock_owned() else {
            debug!(url = %self.shared.url, "key feed refresh already in flight");
            return;
        };

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let _guard = guard;

            // A refresh may have landed between the caller's snapshot and
            // taking the lock.
            if shared.freshness_now().await == Some(Freshness::Fresh) {
                debug!(url = %shared.url, "key feed already refreshed, skipping");
                return;
            }

            if let Err(e) = shared.fetch_and_store().await {
                warn!(url = %shared.url, error = %e, "background key feed refresh failed");
            }
        });
    }

    async fn fetch_blocking(&self) -> FetchResult<Arc<[u8]>> {
        let _guard = self.shared.refresh_lock.lock().await;

        // Someone else may have refreshed while we waited for the lock.
        if let Some(entry) = self.snapshot().await {
            if entry.freshness(Instant::now()) != Freshness::Expired {
                debug!(url = %self.shared.url, "key feed refreshed by another caller");
                return Ok(entry.body);
            }
        }

        self.shared.fetch_and_store().await
    }
}

impl Shared {
    async fn freshness_now(&self) -> Option<Freshness> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|entry| entry.freshness(Instant::now()))
    }

    async fn fetch_and_store(&self) -> FetchResult<Arc<[u8]>> {
        debug!(url = %self.url, "fetching key feed");
        let fetched = self.transport.get(&self.url).await?;
        let body: Arc<[u8]> = fetched.body.into();

        *self.state.write().await = Some(CacheEntry {
            body: Arc::clone(&body),
            fetched_at: Instant::now(),
            max_age: fetched.max_age,
        });

        Ok(body)
    }
}

#[async_trait]
impl KeyFeedFetcher for KeyFeedCache {
    async fn fetch(&self) -> FetchResult<Arc<[u8]>> {
        if let Some(entry) = self.snapshot().await {
            match entry.freshness(Instant::now()) {
                Freshness::Fresh => return Ok(entry.body),
                Freshness::Stale => {
                    debug!(url = %self.shared.url, "serving stale key feed, refreshing");
                    self.spawn_refresh();
                    return Ok(entry.body);
                }
                Freshness::Expired => {
                    debug!(url = %self.shared.url, "cached key feed expired");
                }
            }
        }

        self.fetch_blocking().await
    }
}

impl std::fmt::Debug for KeyFeedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFeedCache")
            .field("url", &self.shared.url)
            .finish_non_exhaustive()
    }
}
