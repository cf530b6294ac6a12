//! Homomorphic key bundle payloads.
//!
//! These structs mirror what the server ships inside `FHE_KEY` and
//! `KEY_ROTATED`. The numeric fields of [`KeyEpochInfo`] are authoritative
//! for key-lifecycle decisions; the timestamp strings are carried opaquely
//! for display.

use serde::{Deserialize, Serialize};

/// Homomorphic algorithm identifier.
///
/// Tags key requests and aggregation requests. Only Paillier exists today;
/// the enum keeps the wire value in one place rather than scattering string
/// literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// The Paillier additively homomorphic cryptosystem.
    #[serde(rename = "PAILLIER")]
    Paillier,
}

impl Algorithm {
    /// The wire form of the identifier, as used in `KEY_ROTATED` map keys.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paillier => "PAILLIER",
        }
    }
}

/// Public key components as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyData {
    /// Modulus `n`.
    pub n: String,
    /// Generator `g`.
    pub g: String,
}

/// Validity window of one homomorphic key epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEpochInfo {
    /// When the key was generated. Display only.
    #[serde(default)]
    pub generated_at: String,

    /// When the server will rotate next. Display only.
    #[serde(default)]
    pub next_rotation_at: String,

    /// Full rotation period in seconds.
    pub rotation_interval: u64,

    /// Seconds left in the window as of when the server sent this message.
    /// The client derives its countdown from this value; it never invents a
    /// rotation interval of its own.
    pub remaining_seconds: u64,
}

/// One algorithm's public key plus its epoch info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBundle {
    /// The public key components.
    pub pub_key: PublicKeyData,
    /// The key's validity window.
    pub key_info: KeyEpochInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_wire_form() {
        assert_eq!(Algorithm::Paillier.as_str(), "PAILLIER");
        assert_eq!(serde_json::to_value(Algorithm::Paillier).unwrap(), "PAILLIER");
    }

    #[test]
    fn key_info_tolerates_missing_display_fields() {
        let info: KeyEpochInfo =
            serde_json::from_str(r#"{"rotation_interval":300,"remaining_seconds":120}"#).unwrap();

        assert_eq!(info.remaining_seconds, 120);
        assert_eq!(info.rotation_interval, 300);
        assert!(info.generated_at.is_empty());
    }

    #[test]
    fn key_info_ignores_unknown_fields() {
        let info: KeyEpochInfo = serde_json::from_str(
            r#"{
                "generated_at": "2025-01-01 00:00:00",
                "next_rotation_at": "2025-01-01 00:05:00",
                "rotation_interval": 300,
                "remaining_seconds": 300,
                "server_time": "2025-01-01 00:00:00"
            }"#,
        )
        .unwrap();

        assert_eq!(info.remaining_seconds, 300);
    }
}
