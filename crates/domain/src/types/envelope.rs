//! The versioned envelope persisted under every managed key

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Unit of persistence: caller data plus the metadata needed for migration,
/// expiry and flow grouping
///
/// Serialized as `{"version", "data", "timestamp", "flowKey"}`; `flowKey` is
/// omitted when the envelope is not flow-scoped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Writer-assigned schema version, always `>= 1`
    pub version: u32,
    /// Opaque caller payload
    pub data: Value,
    /// Write time in milliseconds since the UNIX epoch
    pub timestamp: u64,
    /// Logical flow this envelope belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_key: Option<String>,
}

/// Why a stored value could not be read back as an [`Envelope`]
#[derive(Debug, Error)]
pub enum EnvelopeDecodeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("envelope version must be positive")]
    ZeroVersion,
}

impl Envelope {
    /// Build an envelope
    pub fn new(version: u32, data: Value, timestamp: u64, flow_key: Option<String>) -> Self {
        Self { version, data, timestamp, flow_key }
    }

    /// Decode a raw stored value
    ///
    /// # Errors
    /// Returns an error when the value is not a JSON object with `version`,
    /// `data` and `timestamp`, or when `version` is zero.
    pub fn decode(raw: &str) -> Result<Self, EnvelopeDecodeError> {
        let envelope: Self = serde_json::from_str(raw)?;
        if envelope.version == 0 {
            return Err(EnvelopeDecodeError::ZeroVersion);
        }
        Ok(envelope)
    }

    /// Decode an already parsed JSON value (used by import)
    ///
    /// # Errors
    /// Same conditions as [`Envelope::decode`].
    pub fn from_value(value: Value) -> Result<Self, EnvelopeDecodeError> {
        let envelope: Self = serde_json::from_value(value)?;
        if envelope.version == 0 {
            return Err(EnvelopeDecodeError::ZeroVersion);
        }
        Ok(envelope)
    }

    /// Serialize for storage
    ///
    /// # Errors
    /// Returns an error if the payload cannot be serialized.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Whether the envelope is tagged with `flow_key`
    pub fn belongs_to(&self, flow_key: &str) -> bool {
        self.flow_key.as_deref() == Some(flow_key)
    }

    /// Age relative to `now_ms`; a timestamp in the future counts as age zero
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }
}

/// One managed key together with its decoded envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEntry {
    pub key: String,
    pub envelope: Envelope,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_encode_uses_camel_case_and_omits_missing_flow_key() {
        let tagged = Envelope::new(2, json!({"a": 1}), 42, Some("implicit".to_string()));
        let value: Value = serde_json::from_str(&tagged.encode().unwrap()).unwrap();
        assert_eq!(value["flowKey"], "implicit");
        assert_eq!(value["version"], 2);

        let untagged = Envelope::new(1, json!(null), 42, None);
        let value: Value = serde_json::from_str(&untagged.encode().unwrap()).unwrap();
        assert!(value.get("flowKey").is_none());
    }

    #[test]
    fn test_decode_rejects_corrupt_values() {
        assert!(Envelope::decode("not json").is_err());
        assert!(Envelope::decode("[1, 2]").is_err());
        assert!(Envelope::decode(r#"{"version": 1, "timestamp": 5}"#).is_err());
        assert!(Envelope::decode(r#"{"version": -1, "data": 1, "timestamp": 5}"#).is_err());
        assert!(matches!(
            Envelope::decode(r#"{"version": 0, "data": 1, "timestamp": 5}"#),
            Err(EnvelopeDecodeError::ZeroVersion)
        ));
    }

    #[test]
    fn test_decode_accepts_null_data_and_unknown_fields() {
        let envelope =
            Envelope::decode(r#"{"version": 3, "data": null, "timestamp": 9, "extra": true}"#)
                .unwrap();
        assert_eq!(envelope.version, 3);
        assert_eq!(envelope.data, Value::Null);
        assert_eq!(envelope.flow_key, None);
    }

    #[test]
    fn test_belongs_to_and_age() {
        let envelope = Envelope::new(1, json!(1), 1_000, Some("hybrid".to_string()));
        assert!(envelope.belongs_to("hybrid"));
        assert!(!envelope.belongs_to("implicit"));
        assert_eq!(envelope.age_ms(1_500), 500);
        assert_eq!(envelope.age_ms(500), 0);
    }
}
