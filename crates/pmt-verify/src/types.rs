//! Wire types for the key feed and sealed messages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token protocol version.
///
/// Unknown names are kept verbatim in [`ProtocolVersion::Other`] so a key
/// feed that lists newer key versions still parses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProtocolVersion {
    EcV1,
    EcV2,
    EcV2SigningOnly,
    Other(String),
}

impl ProtocolVersion {
    pub fn as_str(&self) -> &str {
        match self {
            Self::EcV1 => "ECv1",
            Self::EcV2 => "ECv2",
            Self::EcV2SigningOnly => "ECv2SigningOnly",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for ProtocolVersion {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ECv1" => Self::EcV1,
            "ECv2" => Self::EcV2,
            "ECv2SigningOnly" => Self::EcV2SigningOnly,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for ProtocolVersion {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ProtocolVersion> for String {
    fn from(v: ProtocolVersion) -> Self {
        match v {
            ProtocolVersion::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Protocol version the key is used with.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: ProtocolVersion,

    /// Public key (SPKI DER, Base64).
    #[serde(rename = "keyValue")]
    pub key_value: String,

    /// When the key stops being valid. Absent means never.
    #[serde(
        rename = "keyExpiration",
        default,
        with = "expiration_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration: Option<DateTime<Utc>>,
}

impl KeyRecord {
    /// Whether the key is past its expiration at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiration, Some(expires_at) if now > expires_at)
    }
}

/// Response body of the key feed endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyFeed {
    pub keys: Vec<KeyRecord>,
}

/// Intermediate signing key, certified by the root keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntermediateSigningKey {
    /// JSON text of a single [`KeyRecord`]. These exact bytes are what the
    /// root keys signed; never re-serialize them.
    #[serde(rename = "signedKey")]
    pub signed_key: String,

    /// Base64-encoded DER signatures over the signed key.
    pub signatures: Vec<String>,
}

/// Outer sealed message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedMessage {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: ProtocolVersion,

    #[serde(rename = "intermediateSigningKey")]
    pub intermediate_signing_key: IntermediateSigningKey,

    /// Opaque payload, returned verbatim on success.
    #[serde(rename = "signedMessage")]
    pub signed_message: String,

    /// Base64-encoded DER signature by the intermediate key.
    pub signature: String,
}

/// `keyExpiration` is a decimal string of milliseconds since the Unix epoch.
mod expiration_millis {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(at) => serializer.serialize_str(&at.timestamp_millis().to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let raw = match raw.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(s) => s,
        };

        let millis: i64 = raw
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid keyExpiration {raw:?}: {e}")))?;

        DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("keyExpiration out of range: {millis}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_protocol_version_roundtrip_names() {
        for name in ["ECv1", "ECv2", "ECv2SigningOnly", "ECv3"] {
            let v = ProtocolVersion::from(name);
            assert_eq!(v.as_str(), name);
            assert_eq!(String::from(v), name);
        }
        assert_eq!(
            ProtocolVersion::from("ECv3"),
            ProtocolVersion::Other("ECv3".to_string())
        );
    }

    #[test]
    fn test_key_feed_parses_google_shape() {
        let json = r#"{
            "keys": [
                {"keyValue": "AAAA", "protocolVersion": "ECv1"},
                {"keyValue": "BBBB", "protocolVersion": "ECv2", "keyExpiration": "2154841200000"},
                {"keyValue": "CCCC", "protocolVersion": "ECv2SigningOnly", "keyExpiration": ""}
            ]
        }"#;

        let feed: KeyFeed = serde_json::from_str(json).unwrap();
        assert_eq!(feed.keys.len(), 3);
        assert_eq!(feed.keys[0].protocol_version, ProtocolVersion::EcV1);
        assert_eq!(feed.keys[0].expiration, None);
        assert_eq!(
            feed.keys[1].expiration.unwrap().timestamp_millis(),
            2_154_841_200_000
        );
        assert_eq!(feed.keys[2].expiration, None);
    }

    #[test]
    fn test_key_expiration_rejects_non_numeric() {
        let json = r#"{"keyValue": "AAAA", "protocolVersion": "ECv2", "keyExpiration": "soon"}"#;
        let result: Result<KeyRecord, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_key_record_serializes_expiration_as_millis_string() {
        let record = KeyRecord {
            protocol_version: ProtocolVersion::EcV2,
            key_value: "AAAA".to_string(),
            expiration: DateTime::from_timestamp_millis(1_700_000_000_123),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["keyExpiration"], "1700000000123");
        assert_eq!(value["protocolVersion"], "ECv2");

        let parsed: KeyRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_is_expired_at() {
        let now = Utc::now();
        let mut record = KeyRecord {
            protocol_version: ProtocolVersion::EcV2,
            key_value: String::new(),
            expiration: None,
        };
        assert!(!record.is_expired_at(now));

        record.expiration = Some(now - Duration::seconds(1));
        assert!(record.is_expired_at(now));

        record.expiration = Some(now + Duration::hours(1));
        assert!(!record.is_expired_at(now));
    }

    #[test]
    fn test_sealed_message_keeps_signed_key_text() {
        let signed_key = r#"{"keyValue":"AAAA","keyExpiration":"1","protocolVersion":"ECv2SigningOnly"}"#;
        let json = serde_json::json!({
            "protocolVersion": "ECv2SigningOnly",
            "intermediateSigningKey": {
                "signedKey": signed_key,
                "signatures": ["c2ln"]
            },
            "signedMessage": "{\"x\":1}",
            "signature": "c2ln"
        });

        let msg: SealedMessage = serde_json::from_value(json).unwrap();
        assert_eq!(msg.intermediate_signing_key.signed_key, signed_key);
        assert_eq!(msg.protocol_version, ProtocolVersion::EcV2SigningOnly);
    }
}
