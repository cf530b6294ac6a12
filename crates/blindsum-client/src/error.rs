//! Error types for the client state machine.
//!
//! One taxonomy for everything the caller can see. Cryptographic primitive
//! failures are wrapped, never swallowed: each reaches the caller as a
//! [`crate::ClientAction::Failed`] action, and nothing here retries a
//! cryptographic operation (the key manager's time-driven refetch is the only
//! built-in retry in the crate).

use blindsum_crypto::{DecryptionError, KeyAgreementError, PaillierError};
use thiserror::Error;

/// Errors surfaced by [`crate::Client`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The transport is unavailable or was lost mid-operation. The client
    /// never reconnects on its own.
    #[error("transport unavailable: {reason}")]
    Connection {
        /// What the transport reported.
        reason: String,
    },

    /// Peer key material was malformed or invalid. Terminal for that
    /// handshake; a restart needs an explicit new `StartHandshake`.
    #[error(transparent)]
    KeyAgreement(#[from] KeyAgreementError),

    /// The server reported that key agreement failed on its side.
    #[error("handshake rejected by peer: {reason}")]
    HandshakeFailed {
        /// The server-supplied reason.
        reason: String,
    },

    /// A received message failed authentication and was dropped.
    #[error(transparent)]
    Decryption(#[from] DecryptionError),

    /// The server delivered an unusable homomorphic public key.
    #[error(transparent)]
    Paillier(#[from] PaillierError),

    /// Encryption was attempted with no active homomorphic key. Fetch a key
    /// first, then retry.
    #[error("no active homomorphic key")]
    InvalidKey,

    /// Key fetch failed; homomorphic encryption stays disabled until a key
    /// is obtained.
    #[error("homomorphic key unavailable: {reason}")]
    KeyUnavailable {
        /// Why the key could not be obtained.
        reason: String,
    },

    /// The operation is not legal in the current state (for example an
    /// overlapping submission, or a handshake reply nobody is waiting for).
    #[error("invalid state: cannot {operation} while {state}")]
    InvalidState {
        /// Operation that was attempted.
        operation: String,
        /// State that made it illegal.
        state: String,
    },

    /// Queued ciphertexts were encrypted under a superseded key epoch and
    /// were discarded at submission time instead of being sent.
    #[error("{dropped} ciphertext(s) from a superseded key epoch discarded")]
    StaleCiphertexts {
        /// How many packets were discarded.
        dropped: usize,
    },
}

impl ClientError {
    /// Convenience constructor for [`ClientError::InvalidState`].
    pub fn invalid_state(operation: impl Into<String>, state: impl Into<String>) -> Self {
        Self::InvalidState { operation: operation.into(), state: state.into() }
    }
}
