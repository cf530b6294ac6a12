//! Blindsum Cryptographic Primitives
//!
//! Cryptographic building blocks for the blindsum client. Value types and
//! pure functions only; protocol state lives in `blindsum-client`.
//!
//! # Key Lifecycle
//!
//! The secure channel derives one symmetric key per handshake. An ephemeral
//! P-256 keypair is generated for a single handshake attempt, agreed with the
//! peer's ephemeral key, and expanded into an AES-256-GCM channel key. The
//! keypair is discarded as soon as the channel key exists.
//!
//! ```text
//! Ephemeral P-256 Keypair (per handshake)
//!        │
//!        ▼
//! ECDH → Shared Secret
//!        │
//!        ▼
//! HKDF-SHA256 → Channel Key (256-bit)
//!        │
//!        ▼
//! AES-256-GCM → Sealed Messages
//! ```
//!
//! Separately, [`paillier`] implements the client half of an additively
//! homomorphic cryptosystem: integers are encrypted under a server-supplied
//! public key `(n, g)` so the server can aggregate ciphertexts without ever
//! seeing plaintext.
//!
//! # Security
//!
//! Channel:
//! - Peer public keys are validated before use: malformed encodings, the
//!   point at infinity, and off-curve points are all rejected explicitly
//! - Every seal operation uses a fresh random 96-bit nonce
//! - Failed authentication -> reject message, never partial plaintext
//! - Secrets (shared secret, channel key) are zeroized on drop
//!
//! Paillier:
//! - Encryption is probabilistic: a uniformly random blinding factor coprime
//!   to `n` is drawn per ciphertext, so equal plaintexts produce distinct
//!   ciphertexts
//! - Ciphertexts are only meaningful within one key epoch; epoch tracking is
//!   the caller's concern

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod channel;
pub mod paillier;

pub use channel::{
    CHANNEL_KEY_INFO, CURVE_NAME, ChannelKey, DecryptionError, EphemeralKeyPair,
    KeyAgreementError, NONCE_SIZE, SealedMessage, SharedSecret, derive_channel_key,
    derive_shared_secret, open, parse_peer_public_key, seal,
};
pub use paillier::{PaillierError, PaillierPublicKey, encrypt};
