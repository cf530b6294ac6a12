//! Error types for Paillier encryption.

use thiserror::Error;

/// Errors from public key validation.
///
/// Encryption itself cannot fail once a key has been validated, so this is
/// the only failure surface of the module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaillierError {
    /// The key components do not form a usable public key.
    #[error("invalid homomorphic public key: {reason}")]
    InvalidKey {
        /// What made the key unusable.
        reason: String,
    },
}
