//! Signing keys provider: decodes the key feed into [`KeyRecord`]s.
//!
//! Freshness policy lives entirely in the fetcher; this layer only decodes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::KeyFeedConfig;
use crate::error::{ConfigError, KeysError, KeysResult};
use crate::feed::{KeyFeedCache, KeyFeedFetcher};
use crate::types::{KeyFeed, KeyRecord};

/// Source of the current root signing keys.
#[async_trait]
pub trait SigningKeySource: Send + Sync {
    /// Keys in feed order.
    async fn get_signing_keys(&self) -> KeysResult<Vec<KeyRecord>>;
}

/// [`SigningKeySource`] over a [`KeyFeedFetcher`].
#[derive(Clone)]
pub struct SigningKeysProvider {
    fetcher: Arc<dyn KeyFeedFetcher>,
}

impl SigningKeysProvider {
    pub fn new(fetcher: Arc<dyn KeyFeedFetcher>) -> Self {
        Self { fetcher }
    }

    /// Provider over an https key feed cache built from `config`.
    pub fn from_config(config: &KeyFeedConfig) -> Result<Self, ConfigError> {
        let cache = KeyFeedCache::from_config(config)?;
        Ok(Self::new(Arc::new(cache)))
    }
}

#[async_trait]
impl SigningKeySource for SigningKeysProvider {
    async fn get_signing_keys(&self) -> KeysResult<Vec<KeyRecord>> {
        let body = self.fetcher.fetch().await?;

        let feed: KeyFeed = serde_json::from_slice(&body).map_err(|e| KeysError::Parse {
            message: e.to_string(),
        })?;

        debug!(keys = feed.keys.len(), "decoded signing keys");
        Ok(feed.keys)
    }
}

impl std::fmt::Debug for SigningKeysProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeysProvider").finish_non_exhaustive()
    }
}
