//! Secure channel primitives: key agreement and message sealing.
//!
//! The two halves of the channel are split the way they are used: the
//! agreement functions run exactly once per handshake, the seal/open
//! functions run once per message under the derived [`ChannelKey`].

mod agreement;
mod encryption;
mod error;

pub use agreement::{
    CHANNEL_KEY_INFO, CURVE_NAME, EphemeralKeyPair, SharedSecret, derive_channel_key,
    derive_shared_secret, parse_peer_public_key,
};
pub use encryption::{ChannelKey, NONCE_SIZE, SealedMessage, open, seal};
pub use error::{DecryptionError, KeyAgreementError};
