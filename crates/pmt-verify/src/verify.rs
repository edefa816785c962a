//! Sealed message verification.
//!
//! # Verification Steps
//!
//! 1. Parse the sealed message and check its protocol version
//! 2. Verify the intermediate signing key against the root keys over
//!    `LV(sender_id, protocol_version, signed_key)`
//! 3. Parse and check the intermediate key
//! 4. Verify the message signature against the intermediate key over
//!    `LV(sender_id, recipient_id, protocol_version, signed_message)`
//!
//! Any expired key in a candidate set rejects the whole set. A root
//! signature is accepted if any attached signature verifies under any
//! published root key.

use std::sync::Arc;

use chrono::Utc;
use p256::ecdsa::VerifyingKey;
use tracing::debug;

use crate::config::RecipientConfig;
use crate::crypto::{decode_public_key, decode_signature, verify_any};
use crate::encoding::to_length_value;
use crate::error::{ConfigError, ProtocolError, ProtocolResult};
use crate::keys::SigningKeySource;
use crate::types::{IntermediateSigningKey, KeyRecord, ProtocolVersion, SealedMessage};

/// Verifies sealed messages for one recipient. Stateless between calls.
#[derive(Clone)]
pub struct TokenVerifier {
    config: RecipientConfig,
    keys: Arc<dyn SigningKeySource>,
}

impl TokenVerifier {
    /// Create a verifier. Fails on an unsupported protocol version or an
    /// empty sender or recipient id.
    pub fn new(
        config: RecipientConfig,
        keys: Arc<dyn SigningKeySource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, keys })
    }

    /// Protocol version every accepted message must declare.
    pub fn protocol_version(&self) -> &ProtocolVersion {
        &self.config.protocol_version
    }

    /// Recipient id bound into the message signature.
    pub fn recipient_id(&self) -> &str {
        &self.config.recipient_id
    }

    /// Verify `sealed_message` and return its payload bytes verbatim.
    pub async fn unseal(&self, sealed_message: &[u8]) -> ProtocolResult<Vec<u8>> {
        let message: SealedMessage =
            serde_json::from_slice(sealed_message).map_err(|e| ProtocolError::MalformedMessage {
                message: format!("invalid sealed message: {}", e),
            })?;

        if message.protocol_version != self.config.protocol_version {
            return Err(ProtocolError::UnsupportedProtocolVersion {
                version: message.protocol_version.to_string(),
            });
        }

        self.verify_intermediate_signing_key(&message.intermediate_signing_key)
            .await?;
        debug!("intermediate signing key verified");

        let intermediate: KeyRecord =
            serde_json::from_str(&message.intermediate_signing_key.signed_key).map_err(|e| {
                ProtocolError::MalformedMessage {
                    message: format!("invalid intermediate signing key: {}", e),
                }
            })?;
        let intermediate_keys = parse_public_keys(std::slice::from_ref(&intermediate))?;

        let signature = decode_signature(&message.signature)?;
        let signed_bytes = to_length_value([
            self.config.sender_id.as_str(),
            self.config.recipient_id.as_str(),
            self.config.protocol_version.as_str(),
            message.signed_message.as_str(),
        ])?;

        if !verify_any(&[signature], &signed_bytes, &intermediate_keys) {
            return Err(ProtocolError::SignatureVerificationFailed);
        }
        debug!("message signature verified");

        Ok(message.signed_message.into_bytes())
    }

    async fn verify_intermediate_signing_key(
        &self,
        key: &IntermediateSigningKey,
    ) -> ProtocolResult<()> {
        let signatures = key
            .signatures
            .iter()
            .map(|s| decode_signature(s))
            .collect::<ProtocolResult<Vec<_>>>()?;

        let records = self.keys.get_signing_keys().await?;
        let root_keys = parse_public_keys(&records)?;

        let signed_bytes = to_length_value([
            self.config.sender_id.as_str(),
            self.config.protocol_version.as_str(),
            key.signed_key.as_str(),
        ])?;

        if !verify_any(&signatures, &signed_bytes, &root_keys) {
            return Err(ProtocolError::SignatureVerificationFailed);
        }

        Ok(())
    }
}

/// Check expiration and decode each record, in order. The first expired or
/// undecodable record fails the whole set.
fn parse_public_keys(records: &[KeyRecord]) -> ProtocolResult<Vec<VerifyingKey>> {
    let now = Utc::now();
    records
        .iter()
        .map(|record| match record.expiration {
            Some(expired_at) if record.is_expired_at(now) => {
                Err(ProtocolError::ExpiredKey { expired_at })
            }
            _ => decode_public_key(record),
        })
        .collect()
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
