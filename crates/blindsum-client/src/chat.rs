//! Chat audit records.
//!
//! A [`ChatMessage`] is a display-only record of one message that crossed the
//! secure channel. Its lifecycle is independent of the channel itself:
//! records survive channel teardown and handshake restarts, so the caller can
//! keep rendering history after a disconnect.

/// Who produced a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSender {
    /// This client.
    Local,
    /// The peer on the other end of the channel.
    Remote,
}

/// Audit record of one secure-channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Session-local sequence number.
    pub id: u64,
    /// Which side produced the message.
    pub sender: ChatSender,
    /// The decrypted content.
    pub plaintext: String,
    /// The ciphertext as it crossed the wire, base64.
    pub ciphertext: String,
    /// The per-message nonce, base64.
    pub nonce: String,
    /// Wall-clock receive/send time in Unix milliseconds, as of the last
    /// tick.
    pub timestamp_ms: u64,
}
