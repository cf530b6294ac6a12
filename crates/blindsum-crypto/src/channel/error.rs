//! Error types for the secure channel primitives.

use thiserror::Error;

/// Errors from peer public key validation and key agreement.
///
/// All variants are terminal for the handshake attempt that produced them:
/// agreement is a pure function of two keys, so retrying with the same inputs
/// cannot succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyAgreementError {
    /// The peer key bytes are not a valid SEC1 point encoding.
    #[error("malformed peer public key: {reason}")]
    Malformed {
        /// What made the encoding unparseable.
        reason: String,
    },

    /// The peer key encodes the point at infinity.
    ///
    /// Accepting the identity element would fix the shared secret to a value
    /// an attacker controls, so it is rejected before any arithmetic.
    #[error("peer public key is the point at infinity")]
    PointAtInfinity,

    /// The peer key decodes to coordinates that are not on the curve.
    #[error("peer public key is not on the curve")]
    NotOnCurve,
}

/// Authenticated decryption failure.
///
/// Deliberately carries no detail: a tag mismatch, truncated input, and a
/// wrong key are indistinguishable to the caller, and the message is dropped
/// either way.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("message authentication failed")]
pub struct DecryptionError;
