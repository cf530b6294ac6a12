//! Property-based tests for the secure channel primitives.
//!
//! These verify the invariants the rest of the system leans on:
//!
//! 1. **Round-trip**: open(seal(m)) == m for all messages
//! 2. **Symmetry**: both sides of an agreement derive the same channel key
//! 3. **Fail-closed**: any single-bit corruption is rejected

use blindsum_crypto::{
    CHANNEL_KEY_INFO, ChannelKey, DecryptionError, EphemeralKeyPair, derive_channel_key,
    derive_shared_secret, open, parse_peer_public_key, seal,
};
use proptest::prelude::*;

fn fixed_key(fill: u8) -> ChannelKey {
    ChannelKey::new([fill; 32])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_seal_open_roundtrip(
        plaintext in prop::collection::vec(any::<u8>(), 0..1000),
        key_fill in any::<u8>(),
    ) {
        let key = fixed_key(key_fill);

        let sealed = seal(&key, &plaintext);
        let opened = open(&key, &sealed).unwrap();

        prop_assert_eq!(opened, plaintext);
    }

    #[test]
    fn prop_bit_flip_is_rejected(
        plaintext in prop::collection::vec(any::<u8>(), 1..256),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let key = fixed_key(0x42);
        let mut sealed = seal(&key, &plaintext);

        let index = position.index(sealed.ciphertext.len());
        sealed.ciphertext[index] ^= 1 << bit;

        prop_assert_eq!(open(&key, &sealed), Err(DecryptionError));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // Each case runs a full agreement with fresh ephemeral keypairs, so this
    // doubles as a soak test for keypair generation and peer key parsing.
    #[test]
    fn prop_agreement_symmetry(_case in 0u8..20) {
        let alice = EphemeralKeyPair::generate();
        let bob = EphemeralKeyPair::generate();

        let bob_as_seen = parse_peer_public_key(&bob.public_key_bytes()).unwrap();
        let alice_as_seen = parse_peer_public_key(&alice.public_key_bytes()).unwrap();

        let alice_key =
            derive_channel_key(&derive_shared_secret(&alice, &bob_as_seen), CHANNEL_KEY_INFO);
        let bob_key =
            derive_channel_key(&derive_shared_secret(&bob, &alice_as_seen), CHANNEL_KEY_INFO);

        prop_assert_eq!(alice_key.as_bytes(), bob_key.as_bytes());

        // And the derived key actually carries traffic both ways.
        let sealed = seal(&alice_key, b"ping");
        prop_assert_eq!(open(&bob_key, &sealed).unwrap(), b"ping");
    }
}
