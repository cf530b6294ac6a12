//! Top-level client state machine.
//!
//! One [`Client`] value is one session with one server: it owns the handshake,
//! the homomorphic key manager, the outsourcing workflow, and the chat audit
//! log, and it dispatches every inbound event to the right sub-machine. All
//! I/O stays with the caller.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use blindsum_crypto::{DecryptionError, NONCE_SIZE, SealedMessage, open, paillier, seal};
use blindsum_proto::{Algorithm, ClientMessage, KeyEpochInfo, PublicKeyData, ServerMessage};
use tracing::{debug, warn};

use crate::{
    chat::{ChatMessage, ChatSender},
    error::ClientError,
    event::{ClientAction, ClientEvent},
    handshake::{Handshake, HandshakeState},
    key_manager::{KeyEpoch, KeyManager},
    outsourcing::{AggregationResult, BatchState, EncryptedDataPacket, Outsourcing},
};

/// The client session state machine.
///
/// Feed it [`ClientEvent`]s, execute the returned [`ClientAction`]s. Single
/// writer per mutable field by construction: all mutation happens inside
/// [`Client::handle`] on the caller's one consumer loop, so no locking is
/// needed anywhere.
#[derive(Debug, Default)]
pub struct Client {
    handshake: Handshake,
    keys: KeyManager,
    outsourcing: Outsourcing,
    /// Audit log; outlives channel teardown by design.
    chat_log: Vec<ChatMessage>,
    next_chat_id: u64,
    connected: bool,
    /// Wall clock as of the latest tick, for countdowns and audit records.
    last_tick_ms: u64,
}

impl Client {
    /// A fresh session: disconnected, no channel, no key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one event and return the actions it produced.
    pub fn handle(&mut self, event: ClientEvent) -> Vec<ClientAction> {
        match event {
            ClientEvent::Connected => self.on_connected(),
            ClientEvent::Disconnected { reason } => self.on_disconnected(&reason),
            ClientEvent::MessageReceived(message) => self.on_message(message),
            ClientEvent::Tick { now_ms } => self.on_tick(now_ms),
            ClientEvent::StartHandshake => self.start_handshake(),
            ClientEvent::SendChat { text } => self.send_chat(&text),
            ClientEvent::RequestKey => self.request_key(),
            ClientEvent::EncryptValue { value } => self.encrypt_value(value),
            ClientEvent::SubmitBatch => self.submit_batch(),
            ClientEvent::ClearBatch => self.clear_batch(),
        }
    }

    /// True while the transport is up.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Current handshake state.
    pub fn handshake_state(&self) -> HandshakeState {
        self.handshake.state()
    }

    /// True once the secure channel carries traffic.
    pub fn channel_ready(&self) -> bool {
        self.handshake.is_ready()
    }

    /// The chat audit log, oldest first.
    pub fn chat_log(&self) -> &[ChatMessage] {
        &self.chat_log
    }

    /// Current outsourcing batch state.
    pub fn batch_state(&self) -> BatchState {
        self.outsourcing.state()
    }

    /// The queued packets.
    pub fn packets(&self) -> &[EncryptedDataPacket] {
        self.outsourcing.packets()
    }

    /// The stored aggregation result, if a batch completed.
    pub fn aggregation_result(&self) -> Option<&AggregationResult> {
        self.outsourcing.result()
    }

    /// The current homomorphic key epoch.
    pub fn current_epoch(&self) -> KeyEpoch {
        self.keys.current_epoch()
    }

    /// True while a homomorphic key is active and encryption is possible.
    pub fn has_active_key(&self) -> bool {
        self.keys.active().is_some()
    }

    /// Seconds left in the active key's window as of the latest tick.
    pub fn key_remaining_seconds(&self) -> Option<u64> {
        self.keys.remaining_seconds(self.last_tick_ms)
    }

    fn on_connected(&mut self) -> Vec<ClientAction> {
        debug!("transport connected");
        self.connected = true;
        vec![]
    }

    fn on_disconnected(&mut self, reason: &str) -> Vec<ClientAction> {
        warn!(reason, "transport disconnected");
        self.connected = false;
        let mut actions = Vec::new();

        match self.handshake.state() {
            HandshakeState::Idle | HandshakeState::ChannelReady | HandshakeState::Failed => {},
            _pending => actions.push(ClientAction::Failed(ClientError::Connection {
                reason: format!("handshake interrupted: {reason}"),
            })),
        }
        self.handshake.reset();

        if self.keys.on_disconnect() {
            actions.push(ClientAction::Failed(ClientError::KeyUnavailable {
                reason: reason.to_string(),
            }));
        }

        if self.outsourcing.on_disconnect() {
            actions.push(ClientAction::Failed(ClientError::Connection {
                reason: format!("aggregation request abandoned: {reason}"),
            }));
        }

        actions
    }

    fn on_message(&mut self, message: ServerMessage) -> Vec<ClientAction> {
        match message {
            ServerMessage::HandshakeReply { public_key } => {
                match self.handshake.peer_key(&public_key) {
                    Ok(()) => vec![ClientAction::ChannelEstablished],
                    Err(err @ ClientError::InvalidState { .. }) => {
                        warn!(%err, "dropping unexpected handshake reply");
                        vec![]
                    },
                    Err(err) => vec![ClientAction::Failed(err)],
                }
            },
            ServerMessage::HandshakeError { error } => {
                self.handshake.peer_rejected();
                vec![ClientAction::Failed(ClientError::HandshakeFailed { reason: error })]
            },
            ServerMessage::ChatReply { content, nonce } => self.on_chat_reply(content, nonce),
            ServerMessage::FheKey { algorithm: Algorithm::Paillier, pub_key, key_info } => {
                self.install_key(&pub_key, key_info)
            },
            ServerMessage::KeyRotated { keys } => {
                match keys.get(Algorithm::Paillier.as_str()) {
                    Some(bundle) => self.install_key(&bundle.pub_key, bundle.key_info.clone()),
                    None => {
                        warn!("rotation notice without a PAILLIER bundle");
                        vec![]
                    },
                }
            },
            ServerMessage::ComputeResult { ciphertext, plaintext } => {
                match self.outsourcing.on_result(ciphertext, plaintext) {
                    Ok(result) => vec![ClientAction::ResultReceived(result)],
                    Err(err) => {
                        warn!(%err, "dropping uncorrelated aggregation result");
                        vec![]
                    },
                }
            },
        }
    }

    fn on_tick(&mut self, now_ms: u64) -> Vec<ClientAction> {
        self.last_tick_ms = now_ms;

        // Countdown reached zero: ask the server for the authoritative state
        // instead of assuming rotation happened. This is the only built-in
        // retry in the client, and it is driven by time, not by errors.
        if self.connected && self.keys.needs_refresh(now_ms) {
            debug!("key window elapsed; re-requesting current key");
            self.keys.note_fetch_sent();
            return vec![ClientAction::Send(ClientMessage::GetFheKey {
                algorithm: Algorithm::Paillier,
            })];
        }

        vec![]
    }

    fn start_handshake(&mut self) -> Vec<ClientAction> {
        if !self.connected {
            return vec![ClientAction::Failed(ClientError::Connection {
                reason: "cannot start a handshake while disconnected".to_string(),
            })];
        }

        let init = self.handshake.start();
        self.handshake.sent();
        vec![ClientAction::Send(init)]
    }

    fn send_chat(&mut self, text: &str) -> Vec<ClientAction> {
        if !self.connected {
            return vec![ClientAction::Failed(ClientError::Connection {
                reason: "cannot send a chat message while disconnected".to_string(),
            })];
        }

        let Some(key) = self.handshake.channel_key() else {
            return vec![ClientAction::Failed(
                ClientError::invalid_state("send a chat message", self.handshake.state().name()),
            )];
        };

        let sealed = seal(key, text.as_bytes());
        let content = BASE64.encode(&sealed.ciphertext);
        let nonce = BASE64.encode(sealed.nonce);

        let message =
            self.record_chat(ChatSender::Local, text.to_string(), content.clone(), nonce.clone());

        vec![
            ClientAction::Send(ClientMessage::ChatMessage { content, nonce }),
            ClientAction::ChatRecorded(message),
        ]
    }

    fn on_chat_reply(&mut self, content: String, nonce: String) -> Vec<ClientAction> {
        let plaintext = match self.open_chat(&content, &nonce) {
            Ok(plaintext) => plaintext,
            Err(err) => {
                // Fail closed: the message is dropped whole, never partially
                // processed.
                warn!(%err, "dropping undecryptable chat reply");
                return vec![ClientAction::Failed(err)];
            },
        };

        let message = self.record_chat(ChatSender::Remote, plaintext, content, nonce);
        vec![ClientAction::ChatRecorded(message)]
    }

    fn open_chat(&self, content_b64: &str, nonce_b64: &str) -> Result<String, ClientError> {
        let Some(key) = self.handshake.channel_key() else {
            return Err(ClientError::invalid_state(
                "decrypt a chat reply",
                self.handshake.state().name(),
            ));
        };

        let ciphertext = BASE64.decode(content_b64).map_err(|_| DecryptionError)?;
        let nonce_bytes = BASE64.decode(nonce_b64).map_err(|_| DecryptionError)?;
        let nonce: [u8; NONCE_SIZE] = nonce_bytes.try_into().map_err(|_| DecryptionError)?;

        let plaintext = open(key, &SealedMessage { nonce, ciphertext })?;

        // Authenticated but undisplayable content is still unusable.
        String::from_utf8(plaintext).map_err(|_| ClientError::from(DecryptionError))
    }

    fn record_chat(
        &mut self,
        sender: ChatSender,
        plaintext: String,
        ciphertext: String,
        nonce: String,
    ) -> ChatMessage {
        let message = ChatMessage {
            id: self.next_chat_id,
            sender,
            plaintext,
            ciphertext,
            nonce,
            timestamp_ms: self.last_tick_ms,
        };
        self.next_chat_id += 1;
        self.chat_log.push(message.clone());
        message
    }

    fn install_key(&mut self, pub_key: &PublicKeyData, info: KeyEpochInfo) -> Vec<ClientAction> {
        let info_for_action = info.clone();

        match self.keys.install(pub_key, info, self.last_tick_ms) {
            Ok(install) => {
                let mut actions = Vec::new();

                if install.rotated {
                    let cleared_packets = self.outsourcing.invalidate();
                    warn!(
                        epoch = install.epoch.value(),
                        cleared_packets, "key rotated; local ciphertext state invalidated"
                    );
                    actions.push(ClientAction::KeysRotated {
                        epoch: install.epoch,
                        cleared_packets,
                    });
                } else {
                    debug!(epoch = install.epoch.value(), "homomorphic key installed");
                }

                actions.push(ClientAction::KeyUpdated {
                    epoch: install.epoch,
                    info: info_for_action,
                });
                actions
            },
            Err(err) => vec![ClientAction::Failed(err.into())],
        }
    }

    fn request_key(&mut self) -> Vec<ClientAction> {
        if !self.connected {
            return vec![ClientAction::Failed(ClientError::KeyUnavailable {
                reason: "transport unavailable".to_string(),
            })];
        }

        if self.keys.fetch_pending() {
            return vec![ClientAction::Failed(
                ClientError::invalid_state("request a key", "a fetch is already pending"),
            )];
        }

        self.keys.note_fetch_sent();
        vec![ClientAction::Send(ClientMessage::GetFheKey { algorithm: Algorithm::Paillier })]
    }

    fn encrypt_value(&mut self, value: i64) -> Vec<ClientAction> {
        let Some(active) = self.keys.active() else {
            return vec![ClientAction::Failed(ClientError::InvalidKey)];
        };

        let ciphertext = paillier::encrypt(active.key(), value);
        let epoch = active.epoch();

        match self.outsourcing.queue(value, ciphertext, epoch) {
            Ok(packet) => {
                debug!(id = packet.id, epoch = epoch.value(), "value encrypted and queued");
                vec![ClientAction::PacketQueued(packet)]
            },
            Err(err) => vec![ClientAction::Failed(err)],
        }
    }

    fn submit_batch(&mut self) -> Vec<ClientAction> {
        if !self.connected {
            return vec![ClientAction::Failed(ClientError::Connection {
                reason: "cannot submit a batch while disconnected".to_string(),
            })];
        }

        let Some(active) = self.keys.active() else {
            return vec![ClientAction::Failed(ClientError::InvalidKey)];
        };
        let active_epoch = active.epoch();

        match self.outsourcing.submit(active_epoch) {
            Ok(ciphertexts) => {
                let count = ciphertexts.len();
                self.outsourcing.sent();
                vec![
                    ClientAction::Send(ClientMessage::ComputeFhe {
                        algorithm: Algorithm::Paillier,
                        ciphertexts,
                    }),
                    ClientAction::BatchSubmitted { count },
                ]
            },
            Err(err) => vec![ClientAction::Failed(err)],
        }
    }

    fn clear_batch(&mut self) -> Vec<ClientAction> {
        match self.outsourcing.clear() {
            Ok(cleared_packets) => vec![ClientAction::BatchCleared { cleared_packets }],
            Err(err) => vec![ClientAction::Failed(err)],
        }
    }
}
