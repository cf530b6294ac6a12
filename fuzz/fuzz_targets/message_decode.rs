//! Fuzz target for wire message decoding
//!
//! This fuzzer tests JSON message deserialization with:
//! - Malformed JSON and truncated objects
//! - Unknown or mismatched `type` tags
//! - Wrong field types and oversized strings
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use blindsum_proto::{ClientMessage, ServerMessage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Both directions share the decoder machinery; exercise both.
    let _ = ServerMessage::from_json(text);
    let _ = ClientMessage::from_json(text);
});
