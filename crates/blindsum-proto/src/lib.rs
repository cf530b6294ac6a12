//! Blindsum Wire Protocol
//!
//! JSON message vocabulary exchanged with the server over the abstract
//! transport. Every message is a JSON object tagged by a `type` field; the
//! [`ClientMessage`] and [`ServerMessage`] enums cover the full vocabulary in
//! each direction, with encode/decode helpers to and from JSON text.
//!
//! This crate defines shapes only: no cryptography, no state. Binary values
//! (public keys, nonces, AEAD ciphertexts) travel as base64 strings and
//! homomorphic values as decimal strings; conversion happens at the client
//! layer, not here.
//!
//! # Invariants
//!
//! - Each message maps to exactly one `type` tag; unknown tags are a decode
//!   error, never silently ignored
//! - Unknown *fields* inside a known message are ignored, so the server can
//!   extend payloads without breaking older clients
//! - Round-trip encoding must produce an equivalent value

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod keys;
mod message;

pub use error::{ProtocolError, Result};
pub use keys::{Algorithm, KeyBundle, KeyEpochInfo, PublicKeyData};
pub use message::{ClientMessage, ServerMessage};
