//! Protocol messages, tagged by direction.
//!
//! The transport carries JSON objects with a `type` discriminator. Handshake
//! fields use the peer's camelCase names (`publicKey`); the homomorphic key
//! payloads use snake_case (`pub_key`, `key_info`). Both spellings are fixed
//! by the server, so the serde renames below are load-bearing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ProtocolError, Result},
    keys::{Algorithm, KeyBundle, KeyEpochInfo, PublicKeyData},
};

/// Messages the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Open a handshake: our ephemeral public key, base64 over SEC1 bytes.
    #[serde(rename = "HANDSHAKE_INIT")]
    HandshakeInit {
        /// Ephemeral public key, base64.
        #[serde(rename = "publicKey")]
        public_key: String,
    },

    /// An encrypted chat message on an established channel.
    #[serde(rename = "CHAT_MESSAGE")]
    ChatMessage {
        /// AEAD ciphertext, base64.
        content: String,
        /// Per-message nonce, base64.
        nonce: String,
    },

    /// Request the current homomorphic public key.
    #[serde(rename = "GET_FHE_KEY")]
    GetFheKey {
        /// Which algorithm's key to fetch.
        algorithm: Algorithm,
    },

    /// Submit a batch of ciphertexts for server-side aggregation.
    #[serde(rename = "COMPUTE_FHE")]
    ComputeFhe {
        /// Which algorithm the ciphertexts belong to.
        algorithm: Algorithm,
        /// The batch, as decimal ciphertext strings.
        ciphertexts: Vec<String>,
    },
}

/// Messages the server sends to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The server's ephemeral public key, completing the handshake.
    #[serde(rename = "HANDSHAKE_REPLY")]
    HandshakeReply {
        /// Ephemeral public key, base64.
        #[serde(rename = "publicKey")]
        public_key: String,
    },

    /// Server-side key agreement failed; the handshake is dead.
    #[serde(rename = "HANDSHAKE_ERROR")]
    HandshakeError {
        /// Why the server rejected the handshake.
        error: String,
    },

    /// An encrypted chat reply on the established channel.
    #[serde(rename = "CHAT_REPLY")]
    ChatReply {
        /// AEAD ciphertext, base64.
        content: String,
        /// Per-message nonce, base64.
        nonce: String,
    },

    /// The current homomorphic public key and its validity window.
    #[serde(rename = "FHE_KEY")]
    FheKey {
        /// Which algorithm the key belongs to.
        algorithm: Algorithm,
        /// The public key components.
        pub_key: PublicKeyData,
        /// The key's validity window.
        key_info: KeyEpochInfo,
    },

    /// Unsolicited notice that keys were rotated, keyed by algorithm name.
    #[serde(rename = "KEY_ROTATED")]
    KeyRotated {
        /// New key bundles, keyed by the wire algorithm identifier.
        keys: HashMap<String, KeyBundle>,
    },

    /// Result of an aggregation request.
    #[serde(rename = "COMPUTE_RESULT")]
    ComputeResult {
        /// The aggregated ciphertext, decimal string. Older servers send
        /// this under `result`.
        #[serde(alias = "result")]
        ciphertext: String,
        /// Decrypted aggregate, when the server chooses to reveal it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plaintext: Option<i64>,
    },
}

impl ClientMessage {
    /// The wire `type` tag of this message.
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::HandshakeInit { .. } => "HANDSHAKE_INIT",
            Self::ChatMessage { .. } => "CHAT_MESSAGE",
            Self::GetFheKey { .. } => "GET_FHE_KEY",
            Self::ComputeFhe { .. } => "COMPUTE_FHE",
        }
    }

    /// Encode to JSON text for the transport.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::JsonEncode`] if serialization fails
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::JsonEncode(e.to_string()))
    }

    /// Decode from JSON text.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::JsonDecode`] on malformed JSON, an unknown `type`
    ///   tag, or missing required fields
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::JsonDecode(e.to_string()))
    }
}

impl ServerMessage {
    /// The wire `type` tag of this message.
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::HandshakeReply { .. } => "HANDSHAKE_REPLY",
            Self::HandshakeError { .. } => "HANDSHAKE_ERROR",
            Self::ChatReply { .. } => "CHAT_REPLY",
            Self::FheKey { .. } => "FHE_KEY",
            Self::KeyRotated { .. } => "KEY_ROTATED",
            Self::ComputeResult { .. } => "COMPUTE_RESULT",
        }
    }

    /// Encode to JSON text for the transport.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::JsonEncode`] if serialization fails
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::JsonEncode(e.to_string()))
    }

    /// Decode from JSON text.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::JsonDecode`] on malformed JSON, an unknown `type`
    ///   tag, or missing required fields
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::JsonDecode(e.to_string()))
    }
}
