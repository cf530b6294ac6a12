//! Client-side Paillier encryption.
//!
//! Implements the encryption half of the Paillier cryptosystem: the server
//! owns the private key and performs homomorphic aggregation; this client
//! only ever encrypts under the server's public key `(n, g)`.
//!
//! A ciphertext is `c = g^m * r^n mod n²` for plaintext `m` and a uniformly
//! random blinding factor `r` coprime to `n`. The server relies on the
//! additive property `Dec(c1 * c2 mod n²) = m1 + m2 mod n`, which only holds
//! for ciphertexts from the same key epoch.

mod error;

pub use error::PaillierError;

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::OsRng;

/// A Paillier public key received from the server.
///
/// Both components cross the wire as decimal strings; [`from_decimal`]
/// validates them before any arithmetic. One value of this type identifies
/// one key epoch.
///
/// [`from_decimal`]: PaillierPublicKey::from_decimal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaillierPublicKey {
    n: BigUint,
    g: BigUint,
    n_squared: BigUint,
}

impl PaillierPublicKey {
    /// Parse and validate a public key from decimal strings.
    ///
    /// # Errors
    ///
    /// - [`PaillierError::InvalidKey`] if either component is not a decimal
    ///   number, `n < 2`, or `g` is outside `[1, n²)`
    pub fn from_decimal(n: &str, g: &str) -> Result<Self, PaillierError> {
        let n: BigUint = n
            .parse()
            .map_err(|_| PaillierError::InvalidKey { reason: "modulus is not a decimal number".to_string() })?;
        let g: BigUint = g
            .parse()
            .map_err(|_| PaillierError::InvalidKey { reason: "generator is not a decimal number".to_string() })?;

        if n < BigUint::from(2u32) {
            return Err(PaillierError::InvalidKey { reason: "modulus must be at least 2".to_string() });
        }

        let n_squared = &n * &n;
        if g.is_zero() || g >= n_squared {
            return Err(PaillierError::InvalidKey {
                reason: "generator must lie in [1, n^2)".to_string(),
            });
        }

        Ok(Self { n, g, n_squared })
    }

    /// The modulus `n`.
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// The generator `g`.
    pub fn generator(&self) -> &BigUint {
        &self.g
    }
}

/// Encrypt an integer under the public key, returning the ciphertext as a
/// decimal string.
///
/// Probabilistic by construction: every call draws a fresh blinding factor,
/// so encrypting the same value twice produces different ciphertexts with
/// overwhelming probability. Negative values are reduced into `[0, n)`, the
/// standard two's-complement-style embedding the aggregating side undoes
/// modulo `n`.
pub fn encrypt(key: &PaillierPublicKey, value: i64) -> String {
    let m = reduce_value(value, &key.n);
    let r = random_blinding(&key.n);

    let c = (key.g.modpow(&m, &key.n_squared) * r.modpow(&key.n, &key.n_squared)) % &key.n_squared;
    c.to_string()
}

/// Map a signed value into the plaintext space `[0, n)`.
fn reduce_value(value: i64, n: &BigUint) -> BigUint {
    let magnitude = BigUint::from(value.unsigned_abs()) % n;
    if value >= 0 || magnitude.is_zero() { magnitude } else { n - &magnitude }
}

/// Draw a uniformly random blinding factor in `[1, n)` coprime to `n`.
///
/// For a well-formed key (`n = p * q` with large primes) the coprimality
/// check virtually never rejects; the loop exists so a pathological modulus
/// cannot produce a degenerate ciphertext.
fn random_blinding(n: &BigUint) -> BigUint {
    let mut rng = OsRng;
    loop {
        let candidate = rng.gen_biguint_below(n);
        if candidate.gcd(n).is_one() {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1000003 * 1000033, both prime.
    const TEST_N: &str = "1000036000099";
    const TEST_G: &str = "1000036000100";

    fn test_key() -> PaillierPublicKey {
        PaillierPublicKey::from_decimal(TEST_N, TEST_G).unwrap()
    }

    #[test]
    fn parses_valid_key() {
        let key = test_key();
        assert_eq!(key.modulus().to_string(), TEST_N);
        assert_eq!(key.generator().to_string(), TEST_G);
    }

    #[test]
    fn rejects_non_decimal_components() {
        assert!(PaillierPublicKey::from_decimal("not a number", TEST_G).is_err());
        assert!(PaillierPublicKey::from_decimal(TEST_N, "0xff").is_err());
        assert!(PaillierPublicKey::from_decimal("", TEST_G).is_err());
    }

    #[test]
    fn rejects_degenerate_modulus() {
        assert!(PaillierPublicKey::from_decimal("0", "1").is_err());
        assert!(PaillierPublicKey::from_decimal("1", "1").is_err());
    }

    #[test]
    fn rejects_generator_out_of_range() {
        assert!(PaillierPublicKey::from_decimal(TEST_N, "0").is_err());
        // g = n², one past the end of the residue ring.
        let n: BigUint = TEST_N.parse().unwrap();
        let n_squared = (&n * &n).to_string();
        assert!(PaillierPublicKey::from_decimal(TEST_N, &n_squared).is_err());
    }

    #[test]
    fn encryption_is_probabilistic() {
        let key = test_key();

        let first = encrypt(&key, 42);
        let second = encrypt(&key, 42);

        assert_ne!(first, second);
    }

    #[test]
    fn ciphertext_shape() {
        let key = test_key();
        let ciphertext = encrypt(&key, 42);

        assert!(!ciphertext.is_empty());
        assert_ne!(ciphertext, "42");
        // The ciphertext lives in [0, n²), so its decimal form is on the
        // order of the key size, far longer than the plaintext.
        assert!(ciphertext.len() >= TEST_N.len());
    }

    #[test]
    fn reduce_maps_negatives_into_plaintext_space() {
        let n: BigUint = TEST_N.parse().unwrap();

        assert_eq!(reduce_value(0, &n), BigUint::zero());
        assert_eq!(reduce_value(42, &n), BigUint::from(42u32));
        assert_eq!(reduce_value(-5, &n), &n - 5u32);
    }

    #[test]
    fn blinding_factor_is_coprime_and_in_range() {
        let n: BigUint = TEST_N.parse().unwrap();

        for _ in 0..16 {
            let r = random_blinding(&n);
            assert!(r < n);
            assert!(r.gcd(&n).is_one());
        }
    }
}
