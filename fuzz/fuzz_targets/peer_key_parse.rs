//! Fuzz target for peer public key validation
//!
//! This fuzzer feeds arbitrary bytes into SEC1 point parsing:
//! - Malformed encodings and wrong lengths
//! - The identity point and off-curve coordinates
//!
//! The fuzzer should NEVER panic, and any key it accepts must complete an
//! agreement without panicking.

#![no_main]

use blindsum_crypto::{EphemeralKeyPair, derive_shared_secret, parse_peer_public_key};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(peer) = parse_peer_public_key(data) {
        // Accepted keys are on-curve and non-identity; agreement must work.
        let own = EphemeralKeyPair::generate();
        let _ = derive_shared_secret(&own, &peer);
    }
});
