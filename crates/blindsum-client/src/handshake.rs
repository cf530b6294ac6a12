//! Secure channel handshake state machine.
//!
//! One handshake establishes one channel key:
//!
//! ```text
//! Idle → KeypairGenerated → PublicKeySent → AwaitingPeerKey → ChannelReady
//!                                                │
//!                                                ▼
//!                                              Failed
//! ```
//!
//! Exactly one handshake is live at a time. Starting a new one while a
//! previous attempt is pending discards the stale keypair first; completing
//! one discards the keypair and leaves only the channel key.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use blindsum_crypto::{
    CHANNEL_KEY_INFO, ChannelKey, EphemeralKeyPair, KeyAgreementError, derive_channel_key,
    derive_shared_secret, parse_peer_public_key,
};
use blindsum_proto::ClientMessage;
use tracing::{debug, warn};

use crate::error::ClientError;

/// States of the handshake machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    /// No handshake attempted on this session yet.
    #[default]
    Idle,
    /// An ephemeral keypair exists but has not been announced.
    KeypairGenerated,
    /// Our public key was handed to the transport (fire-and-forget).
    PublicKeySent,
    /// Waiting for the peer's public key.
    AwaitingPeerKey,
    /// The channel key is derived; the channel carries traffic.
    ChannelReady,
    /// A cryptographic failure ended this attempt. Terminal until an
    /// explicit restart.
    Failed,
}

impl HandshakeState {
    /// Human-readable state name for logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::KeypairGenerated => "keypair generated",
            Self::PublicKeySent => "public key sent",
            Self::AwaitingPeerKey => "awaiting peer key",
            Self::ChannelReady => "channel ready",
            Self::Failed => "failed",
        }
    }
}

/// The handshake state machine.
///
/// Owns the ephemeral keypair for the lifetime of one attempt and the channel
/// key after success.
#[derive(Debug, Default)]
pub struct Handshake {
    state: HandshakeState,
    keypair: Option<EphemeralKeyPair>,
    channel_key: Option<ChannelKey>,
}

impl Handshake {
    /// A fresh machine in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// The channel key, once the handshake reached `ChannelReady`.
    pub fn channel_key(&self) -> Option<&ChannelKey> {
        self.channel_key.as_ref()
    }

    /// True once the channel carries traffic.
    pub fn is_ready(&self) -> bool {
        self.state == HandshakeState::ChannelReady
    }

    /// Begin a handshake attempt: generate a fresh keypair and produce the
    /// `HANDSHAKE_INIT` message for the caller to transmit.
    ///
    /// Any pending attempt is discarded first; handshakes do not compose.
    /// Call [`Handshake::sent`] after handing the message to the transport.
    pub fn start(&mut self) -> ClientMessage {
        if self.keypair.is_some() {
            debug!(state = self.state.name(), "discarding stale handshake keypair");
        }
        self.channel_key = None;

        let keypair = EphemeralKeyPair::generate();
        self.state = HandshakeState::KeypairGenerated;
        debug!("generated ephemeral keypair");

        let public_key = BASE64.encode(keypair.public_key_bytes());
        self.keypair = Some(keypair);
        self.state = HandshakeState::PublicKeySent;

        ClientMessage::HandshakeInit { public_key }
    }

    /// Note that the init message was handed to the transport; we now wait
    /// for the peer key.
    pub fn sent(&mut self) {
        if self.state == HandshakeState::PublicKeySent {
            self.state = HandshakeState::AwaitingPeerKey;
        } else {
            warn!(state = self.state.name(), "handshake send acknowledged out of order");
        }
    }

    /// Process the peer's public key and derive the channel key.
    ///
    /// Only legal while `AwaitingPeerKey`; a reply in any other state leaves
    /// the machine untouched and returns `InvalidState` so the caller can
    /// drop it. Any decoding or validation failure is terminal for this
    /// attempt: the machine moves to `Failed` and the keypair is discarded.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidState`] if no handshake is awaiting a key
    /// - [`ClientError::KeyAgreement`] if the peer key is malformed, the
    ///   point at infinity, or off-curve
    pub fn peer_key(&mut self, public_key_b64: &str) -> Result<(), ClientError> {
        if self.state != HandshakeState::AwaitingPeerKey {
            return Err(ClientError::invalid_state("process a peer key", self.state.name()));
        }

        let bytes = match BASE64.decode(public_key_b64) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.fail();
                return Err(KeyAgreementError::Malformed { reason: format!("invalid base64: {e}") }
                    .into());
            },
        };

        let peer = match parse_peer_public_key(&bytes) {
            Ok(peer) => peer,
            Err(e) => {
                self.fail();
                return Err(e.into());
            },
        };

        let Some(keypair) = self.keypair.take() else {
            self.fail();
            return Err(ClientError::invalid_state("process a peer key", "no keypair held"));
        };

        let shared = derive_shared_secret(&keypair, &peer);
        self.channel_key = Some(derive_channel_key(&shared, CHANNEL_KEY_INFO));
        // keypair is dropped here; only the channel key survives
        self.state = HandshakeState::ChannelReady;
        debug!("channel key derived, handshake complete");

        Ok(())
    }

    /// The peer reported that agreement failed on its side.
    pub fn peer_rejected(&mut self) {
        warn!(state = self.state.name(), "peer rejected handshake");
        self.fail();
    }

    /// Tear down for a lost transport: back to `Idle`, dropping all key
    /// material. Restarting is the caller's decision.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn fail(&mut self) {
        self.keypair = None;
        self.channel_key = None;
        self.state = HandshakeState::Failed;
    }
}
