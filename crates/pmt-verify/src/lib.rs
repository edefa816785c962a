//! Payment method token verification.
//!
//! This crate verifies `ECv2SigningOnly` sealed messages, providing:
//!
//! - Stale-while-revalidate caching of the remote signing key feed, with at
//!   most one fetch in flight per endpoint
//! - Decoding of the key feed into signing key records
//! - The two-tier signature chain: root keys → intermediate signing key →
//!   message, over the canonical length-value encoding
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pmt_verify::{KeyFeedConfig, RecipientConfig, SigningKeysProvider, TokenVerifier};
//!
//! # async fn example(sealed: &[u8]) -> anyhow::Result<()> {
//! let keys = SigningKeysProvider::from_config(&KeyFeedConfig::test_environment())?;
//! let verifier = TokenVerifier::new(RecipientConfig::new("merchant:12345"), Arc::new(keys))?;
//!
//! let payload = verifier.unseal(sealed).await?;
//! println!("{}", String::from_utf8_lossy(&payload));
//! # Ok(())
//! # }
//! ```
//!
//! # Key Feed Caching
//!
//! The feed's lifetime comes from the response's `Cache-Control: max-age`.
//! Within the first half of it, cached bytes are served as-is; in the second
//! half they are served while a background refresh runs; after it, callers
//! wait for a fresh fetch. A missing or zero `max-age` refetches every call.

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod feed;
pub mod keys;
pub mod types;
pub mod verify;

// Re-export main types
pub use config::{
    KeyFeedConfig, RecipientConfig, KEYS_URL_PRODUCTION, KEYS_URL_TEST,
    SUPPORTED_PROTOCOL_VERSION,
};
pub use encoding::{split_length_value, to_length_value};
pub use error::{
    ConfigError, FetchError, FetchResult, KeysError, KeysResult, ProtocolError, ProtocolResult,
};
pub use feed::{
    parse_max_age, FeedTransport, FetchedFeed, HttpFeedTransport, KeyFeedCache, KeyFeedFetcher,
    StaticKeyFeed,
};
pub use keys::{SigningKeySource, SigningKeysProvider};
pub use types::{IntermediateSigningKey, KeyFeed, KeyRecord, ProtocolVersion, SealedMessage};
pub use verify::TokenVerifier;
