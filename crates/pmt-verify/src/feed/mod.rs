//! Key feed fetching.
//!
//! Two capabilities separate transport from caching:
//!
//! - [`FeedTransport`]: one network fetch, returning the body and the
//!   server-declared freshness lifetime.
//! - [`KeyFeedFetcher`]: "give me the current key feed bytes". Implemented by
//!   [`KeyFeedCache`] (stale-while-revalidate over a transport) and
//!   [`StaticKeyFeed`] (fixed bytes).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchResult;

mod cache;
mod helpers;
mod http;

pub use cache::KeyFeedCache;
pub use helpers::{parse_max_age, validate_endpoint};
pub use http::HttpFeedTransport;

/// Body and freshness lifetime of one key feed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFeed {
    pub body: Vec<u8>,

    /// Parsed from `Cache-Control: max-age`; zero when absent or invalid.
    pub max_age: Duration,
}

/// Fetches a URL once, with no caching.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn get(&self, url: &str) -> FetchResult<FetchedFeed>;
}

/// Source of the current serialized key feed.
#[async_trait]
pub trait KeyFeedFetcher: Send + Sync {
    async fn fetch(&self) -> FetchResult<Arc<[u8]>>;
}

/// Key feed with fixed contents, for pinned key sets and tests.
#[derive(Debug, Clone)]
pub struct StaticKeyFeed {
    body: Arc<[u8]>,
}

impl StaticKeyFeed {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        let body: Vec<u8> = body.into();
        Self { body: body.into() }
    }
}

#[async_trait]
impl KeyFeedFetcher for StaticKeyFeed {
    async fn fetch(&self) -> FetchResult<Arc<[u8]>> {
        Ok(Arc::clone(&self.body))
    }
}
