//! P-256 key agreement and channel key derivation.
//!
//! One handshake runs exactly one agreement: generate an ephemeral keypair,
//! validate the peer's ephemeral public key, compute the ECDH shared secret,
//! and expand it into a [`ChannelKey`] with HKDF-SHA256.

use hkdf::Hkdf;
use p256::{
    EncodedPoint, PublicKey, SecretKey, ecdh,
    elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint},
};
use rand::rngs::OsRng;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{encryption::ChannelKey, error::KeyAgreementError};

/// Named curve both peers fix out of band. Not negotiated on the wire.
pub const CURVE_NAME: &str = "P-256";

/// HKDF info label binding derived keys to the handshake context.
pub const CHANNEL_KEY_INFO: &[u8] = b"handshake data";

/// Size of the raw ECDH shared secret in bytes (P-256 field element).
const SHARED_SECRET_SIZE: usize = 32;

/// Ephemeral keypair for a single handshake attempt.
///
/// Generated fresh per attempt and dropped once a channel key is derived or
/// the handshake fails. The secret scalar never leaves this type.
pub struct EphemeralKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Our public key as uncompressed SEC1 bytes (65 bytes), the encoding
    /// sent to the peer.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public.to_encoded_point(false).as_bytes().to_vec()
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair").field("public", &self.public).finish_non_exhaustive()
    }
}

/// Raw agreed secret, zeroized on drop.
///
/// Only useful as input to [`derive_channel_key`]; never used as a key
/// directly.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_SIZE]);

impl SharedSecret {
    /// The raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Parse and validate a peer public key from SEC1 bytes.
///
/// Validation is explicit and ordered: encoding shape first, then the
/// identity-point check, then curve membership. Silently accepting the
/// identity or an off-curve point is a known protocol-confusion attack
/// surface, so each case gets its own error.
///
/// # Errors
///
/// - [`KeyAgreementError::Malformed`] if the bytes are not a SEC1 point
/// - [`KeyAgreementError::PointAtInfinity`] if they encode the identity
/// - [`KeyAgreementError::NotOnCurve`] if the coordinates fail the curve
///   equation
pub fn parse_peer_public_key(bytes: &[u8]) -> Result<PublicKey, KeyAgreementError> {
    let point = EncodedPoint::from_bytes(bytes)
        .map_err(|e| KeyAgreementError::Malformed { reason: e.to_string() })?;

    if point.is_identity() {
        return Err(KeyAgreementError::PointAtInfinity);
    }

    Option::from(PublicKey::from_encoded_point(&point)).ok_or(KeyAgreementError::NotOnCurve)
}

/// Compute the ECDH shared secret between our ephemeral secret and a
/// validated peer public key.
///
/// Pure function of the two keys: there is nothing to retry on failure, and
/// with a validated peer key it cannot fail.
pub fn derive_shared_secret(own: &EphemeralKeyPair, peer: &PublicKey) -> SharedSecret {
    let shared = ecdh::diffie_hellman(own.secret.to_nonzero_scalar(), peer.as_affine());

    let mut bytes = [0u8; SHARED_SECRET_SIZE];
    bytes.copy_from_slice(shared.raw_secret_bytes());
    SharedSecret(bytes)
}

/// Expand a raw shared secret into a 256-bit channel key.
///
/// HKDF-SHA256 extract-and-expand with an empty salt and the given info
/// label (normally [`CHANNEL_KEY_INFO`]). Both peers run the same derivation
/// over the same secret, so the keys match by construction.
pub fn derive_channel_key(shared: &SharedSecret, info: &[u8]) -> ChannelKey {
    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());

    let mut okm = [0u8; 32];
    let Ok(()) = hkdf.expand(info, &mut okm) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    ChannelKey::new(okm)
}
