//! Configuration records for the key feed and the token recipient.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ProtocolVersion;

/// Production key feed.
pub const KEYS_URL_PRODUCTION: &str =
    "https://payments.developers.google.com/paymentmethodtoken/keys.json";

/// Test environment key feed.
pub const KEYS_URL_TEST: &str =
    "https://payments.developers.google.com/paymentmethodtoken/test/keys.json";

/// The only protocol version the verifier accepts.
pub const SUPPORTED_PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion::EcV2SigningOnly;

/// Key feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFeedConfig {
    /// Key feed URL. Must be https.
    #[serde(default = "default_keys_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_keys_url() -> String {
    KEYS_URL_PRODUCTION.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

impl Default for KeyFeedConfig {
    fn default() -> Self {
        Self {
            url: default_keys_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl KeyFeedConfig {
    /// Config pointing at the test environment key feed.
    pub fn test_environment() -> Self {
        Self::default().with_url(KEYS_URL_TEST)
    }

    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `PMT_KEYS_URL` | Key feed URL |
    /// | `PMT_KEYS_TIMEOUT` | Request timeout in seconds |
    /// | `PMT_KEYS_MAX_RETRIES` | Max retries for transient failures |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("PMT_KEYS_URL").unwrap_or_else(|_| default_keys_url()),
            timeout_secs: std::env::var("PMT_KEYS_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            max_retries: std::env::var("PMT_KEYS_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
        }
    }

    /// Set the key feed URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// Identity of the token recipient, used when rebuilding signed bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientConfig {
    #[serde(default = "default_protocol_version")]
    pub protocol_version: ProtocolVersion,

    #[serde(default = "default_sender_id")]
    pub sender_id: String,

    /// Usually `merchant:<merchant id>` or `gateway:<gateway id>`.
    pub recipient_id: String,
}

fn default_protocol_version() -> ProtocolVersion {
    SUPPORTED_PROTOCOL_VERSION
}

fn default_sender_id() -> String {
    "Google".to_string()
}

impl RecipientConfig {
    pub fn new(recipient_id: impl Into<String>) -> Self {
        Self {
            protocol_version: default_protocol_version(),
            sender_id: default_sender_id(),
            recipient_id: recipient_id.into(),
        }
    }

    pub fn with_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = sender_id.into();
        self
    }

    pub fn with_protocol_version(mut self, version: impl Into<ProtocolVersion>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Reject anything the verifier cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol_version != SUPPORTED_PROTOCOL_VERSION {
            return Err(ConfigError::UnsupportedProtocolVersion {
                version: self.protocol_version.to_string(),
            });
        }

        if self.sender_id.is_empty() {
            return Err(ConfigError::MissingField { field: "sender_id" });
        }

        if self.recipient_id.is_empty() {
            return Err(ConfigError::MissingField {
                field: "recipient_id",
            });
        }

        Ok(())
    }
}
