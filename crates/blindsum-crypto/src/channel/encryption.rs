//! Channel message encryption using AES-256-GCM.
//!
//! One [`ChannelKey`] seals every message on an established channel. Nonces
//! are drawn fresh from the OS RNG for every seal call; with 96 random bits
//! per message, uniqueness under one key holds with overwhelming probability
//! for any realistic message count.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use rand::{RngCore, rngs::OsRng};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::DecryptionError;

/// AES-GCM nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size (16 bytes).
const GCM_TAG_SIZE: usize = 16;

/// Symmetric key for one secure channel.
///
/// Derived exactly once per successful handshake and shared by all seal/open
/// calls until the channel is torn down or superseded. Never reused across
/// distinct handshakes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ChannelKey([u8; 32]);

impl ChannelKey {
    /// Wrap raw key material. Normally only called by
    /// [`super::derive_channel_key`].
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChannelKey(..)")
    }
}

/// A sealed message: nonce plus ciphertext (tag included).
///
/// Produced from exactly one key and one plaintext. The nonce travels with
/// the ciphertext so the receiver can open it without shared counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// The 96-bit nonce used for this message.
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext including the 16-byte GCM tag.
    pub ciphertext: Vec<u8>,
}

impl SealedMessage {
    /// Plaintext length (ciphertext length minus authentication tag).
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(GCM_TAG_SIZE)
    }
}

/// Seal a plaintext under the channel key.
///
/// Generates a fresh random nonce per call; no other state is consulted or
/// mutated.
pub fn seal(key: &ChannelKey, plaintext: &[u8]) -> SealedMessage {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    #[allow(deprecated)]
    let Ok(ciphertext) = cipher.encrypt(Nonce::from_slice(&nonce), plaintext) else {
        unreachable!("AES-256-GCM encryption cannot fail with valid inputs");
    };

    SealedMessage { nonce, ciphertext }
}

/// Open a sealed message.
///
/// Fails closed: a tag mismatch, truncated ciphertext, or wrong key all
/// yield [`DecryptionError`], never partial plaintext.
///
/// # Errors
///
/// - [`DecryptionError`] if authentication fails for any reason
pub fn open(key: &ChannelKey, message: &SealedMessage) -> Result<Vec<u8>, DecryptionError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    #[allow(deprecated)]
    cipher
        .decrypt(Nonce::from_slice(&message.nonce), message.ciphertext.as_slice())
        .map_err(|_| DecryptionError)
}
