//! ECDSA P-256 / SHA-256 primitives used by the verifier.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use p256::ecdsa::{signature::Verifier, Signature, VerifyingKey};

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::KeyRecord;

/// Decode a key record's Base64 SPKI public key.
pub fn decode_public_key(record: &KeyRecord) -> ProtocolResult<VerifyingKey> {
    use p256::pkcs8::DecodePublicKey;

    let bytes = BASE64
        .decode(record.key_value.trim())
        .map_err(|e| ProtocolError::InvalidKeyEncoding {
            message: format!("invalid base64 public key: {}", e),
        })?;

    VerifyingKey::from_public_key_der(&bytes).map_err(|e| ProtocolError::InvalidKeyEncoding {
        message: format!("invalid SPKI public key: {}", e),
    })
}

/// Decode a Base64 signature to its DER bytes.
pub fn decode_signature(b64: &str) -> ProtocolResult<Vec<u8>> {
    BASE64
        .decode(b64)
        .map_err(|e| ProtocolError::MalformedSignature {
            message: format!("invalid base64 signature: {}", e),
        })
}

/// Whether any signature verifies `message` under any key.
///
/// Bytes that are not a DER signature count as a failed check, not an error.
pub fn verify_any(signatures: &[Vec<u8>], message: &[u8], keys: &[VerifyingKey]) -> bool {
    let parsed: Vec<Signature> = signatures
        .iter()
        .filter_map(|der| Signature::from_der(der).ok())
        .collect();

    keys.iter().any(|key| {
        parsed
            .iter()
            .any(|signature| key.verify(message, signature).is_ok())
    })
}
