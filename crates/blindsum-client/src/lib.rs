//! Client
//!
//! Action-based client state machine for the blindsum protocol. Manages the
//! secure-channel handshake, chat sealing, the homomorphic key lifecycle, and
//! the outsourced-aggregation workflow.
//!
//! # Architecture
//!
//! The client is Sans-IO: it receives events ([`ClientEvent`]) from the
//! caller, processes them through pure state machine logic, and returns
//! actions ([`ClientAction`]) for the caller to execute. The caller owns the
//! transport (delivering decoded [`blindsum_proto::ServerMessage`]s and
//! connection lifecycle events), a once-per-second tick source, and the UI.
//!
//! One [`Client`] value is one session: created when the transport connects,
//! dropped when it goes away. There is no global state and no locking; all
//! mutation happens inside `handle`, on the caller's single consumer loop.
//!
//! # Components
//!
//! - [`Client`]: top-level state machine dispatching events
//! - [`Handshake`]: ECDH handshake producing the channel key
//! - [`KeyManager`]: homomorphic key epochs, countdown, and rotation
//! - [`Outsourcing`]: ciphertext batch lifecycle and result correlation
//! - [`ClientEvent`] / [`ClientAction`]: the caller-facing interface

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chat;
mod client;
mod error;
mod event;
mod handshake;
mod key_manager;
mod outsourcing;

pub use chat::{ChatMessage, ChatSender};
pub use client::Client;
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent};
pub use handshake::{Handshake, HandshakeState};
pub use key_manager::{ActiveKey, KeyEpoch, KeyInstall, KeyManager};
pub use outsourcing::{AggregationResult, BatchState, EncryptedDataPacket, Outsourcing};
