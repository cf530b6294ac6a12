//! Client events and actions.

use blindsum_proto::{ClientMessage, KeyEpochInfo, ServerMessage};

use crate::{
    chat::ChatMessage,
    error::ClientError,
    key_manager::KeyEpoch,
    outsourcing::{AggregationResult, EncryptedDataPacket},
};

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Driving the transport: decoding inbound JSON with `blindsum-proto` and
///   delivering connection lifecycle changes
/// - Ticking roughly once per second with wall-clock time
/// - Forwarding application intents (start handshake, send chat, etc.)
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The transport connection is established.
    Connected,

    /// The transport connection was lost or closed.
    Disconnected {
        /// What the transport reported.
        reason: String,
    },

    /// A decoded message arrived from the server.
    MessageReceived(ServerMessage),

    /// Periodic tick for countdown processing and housekeeping.
    Tick {
        /// Current wall-clock time in Unix milliseconds.
        now_ms: u64,
    },

    /// Application wants to open a secure channel.
    StartHandshake,

    /// Application wants to send a chat message over the channel.
    SendChat {
        /// Message plaintext.
        text: String,
    },

    /// Application wants to fetch (or refresh) the homomorphic key.
    RequestKey,

    /// Application wants to encrypt a value into the pending batch.
    EncryptValue {
        /// The sensitive integer to encrypt locally.
        value: i64,
    },

    /// Application wants to submit the batch for aggregation.
    SubmitBatch,

    /// Application wants to drop the batch and any stored result.
    ClearBatch,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone)]
pub enum ClientAction {
    /// Send a message to the server (encode with `blindsum-proto`).
    Send(ClientMessage),

    /// The secure channel is established; chat may flow.
    ChannelEstablished,

    /// A chat message was added to the audit log (either direction).
    ChatRecorded(ChatMessage),

    /// A homomorphic key (new or refreshed) is active.
    KeyUpdated {
        /// The epoch the key belongs to.
        epoch: KeyEpoch,
        /// Its validity window, for countdown display.
        info: KeyEpochInfo,
    },

    /// The key epoch was superseded; local ciphertext state was invalidated.
    KeysRotated {
        /// The new epoch.
        epoch: KeyEpoch,
        /// How many queued packets were dropped.
        cleared_packets: usize,
    },

    /// A value was encrypted and queued for outsourcing.
    PacketQueued(EncryptedDataPacket),

    /// The batch was handed to the transport for aggregation.
    BatchSubmitted {
        /// Number of ciphertexts in the request.
        count: usize,
    },

    /// The batch and any stored result were cleared on user request.
    BatchCleared {
        /// How many packets were dropped.
        cleared_packets: usize,
    },

    /// The server returned an aggregation result for the in-flight batch.
    ResultReceived(AggregationResult),

    /// An operation failed. The caller owns user-visible messaging; the
    /// client never retries cryptographic operations on its own.
    Failed(ClientError),
}
