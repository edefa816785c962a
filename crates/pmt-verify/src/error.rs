//! Error types for key fetching and token verification.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Construction-time errors. Never returned once a component is built.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Key feed endpoint does not use an encrypted transport.
    #[error("key feed endpoint must use https: {url}")]
    InsecureEndpoint { url: String },

    /// Key feed endpoint is not a valid URL.
    #[error("invalid key feed endpoint: {url} - {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// Only one protocol version can be verified.
    #[error("unsupported protocol version: {version}")]
    UnsupportedProtocolVersion { version: String },

    /// A required identity field is empty.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// HTTP client could not be built.
    #[error("failed to create HTTP client: {message}")]
    HttpClient { message: String },
}

/// Key feed transport errors.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network or body read failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// Rate limit exceeded.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Non-success status from the key feed endpoint.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
}

impl FetchError {
    /// Whether the request may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Signing keys provider errors.
#[derive(Debug, thiserror::Error)]
pub enum KeysError {
    /// The key feed could not be downloaded.
    #[error("failed to download signing keys: {0}")]
    Download(#[from] FetchError),

    /// The key feed body is not a valid key list.
    #[error("failed to parse signing keys: {message}")]
    Parse { message: String },
}

/// Token verification errors.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Sealed message (or the signed key inside it) is not valid JSON of the
    /// expected shape.
    #[error("malformed message: {message}")]
    MalformedMessage { message: String },

    /// Message declares a protocol version other than the configured one.
    #[error("unsupported protocol version: {version}")]
    UnsupportedProtocolVersion { version: String },

    /// A signature is not valid base64.
    #[error("malformed signature: {message}")]
    MalformedSignature { message: String },

    /// Root signing keys could not be obtained.
    #[error("signing key source error: {0}")]
    KeySource(#[from] KeysError),

    /// A candidate key is past its expiration.
    #[error("key expired at {expired_at}")]
    ExpiredKey { expired_at: DateTime<Utc> },

    /// Key material is not a base64 SPKI P-256 public key.
    #[error("invalid key encoding: {message}")]
    InvalidKeyEncoding { message: String },

    /// No signature validated. Deliberately carries no detail.
    #[error("could not verify signature")]
    SignatureVerificationFailed,
}

impl ProtocolError {
    /// Whether a later `unseal` of the same message could succeed.
    ///
    /// Only transient key feed failures qualify; every other failure is a
    /// property of the message or of the published keys.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::KeySource(KeysError::Download(e)) if e.is_retryable())
    }
}

/// Result type for key feed fetches.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for signing key lookups.
pub type KeysResult<T> = Result<T, KeysError>;

/// Result type for token verification.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
