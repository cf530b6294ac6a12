//! Property-based tests for Paillier encryption.
//!
//! The production crate never decrypts (the private key lives on the
//! server), so these tests carry a reference decryptor built from a small
//! known factorization. It exists to verify two contracts:
//!
//! 1. **Round-trip**: the server can recover every value we encrypt
//! 2. **Additive homomorphism**: `Dec(c1 * c2 mod n²) = m1 + m2 mod n`

use blindsum_crypto::{PaillierPublicKey, encrypt};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::One;
use proptest::prelude::*;

// Two small primes; large enough that random blinding factors are
// overwhelmingly coprime to n, small enough to keep the tests instant.
const P: u64 = 1_000_003;
const Q: u64 = 1_000_033;

/// Reference Paillier decryptor: `m = L(c^λ mod n²) * μ mod n`.
struct TestDecryptor {
    n: BigUint,
    n_squared: BigUint,
    lambda: BigUint,
    mu: BigUint,
}

impl TestDecryptor {
    fn new() -> Self {
        let p = BigUint::from(P);
        let q = BigUint::from(Q);
        let n = &p * &q;
        let n_squared = &n * &n;
        let g = &n + 1u32;

        let lambda = (&p - 1u32).lcm(&(&q - 1u32));
        let mu = mod_inverse(&l_function(&g.modpow(&lambda, &n_squared), &n), &n);

        Self { n, n_squared, lambda, mu }
    }

    fn public_key(&self) -> PaillierPublicKey {
        let g = (&self.n + 1u32).to_string();
        PaillierPublicKey::from_decimal(&self.n.to_string(), &g).unwrap()
    }

    fn decrypt(&self, ciphertext: &str) -> BigUint {
        let c: BigUint = ciphertext.parse().unwrap();
        (l_function(&c.modpow(&self.lambda, &self.n_squared), &self.n) * &self.mu) % &self.n
    }

    /// The value a signed plaintext maps to in `[0, n)`.
    fn embed(&self, value: i64) -> BigUint {
        let n = BigInt::from(self.n.clone());
        BigInt::from(value).mod_floor(&n).to_biguint().unwrap()
    }
}

fn l_function(x: &BigUint, n: &BigUint) -> BigUint {
    (x - 1u32) / n
}

fn mod_inverse(a: &BigUint, m: &BigUint) -> BigUint {
    let m_int = BigInt::from(m.clone());
    let gcd = BigInt::from(a.clone()).extended_gcd(&m_int);
    assert!(gcd.gcd.is_one(), "inverse exists for well-formed test key");
    gcd.x.mod_floor(&m_int).to_biguint().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_decrypt_recovers_value(value in any::<i64>()) {
        let decryptor = TestDecryptor::new();
        let key = decryptor.public_key();

        let ciphertext = encrypt(&key, value);

        prop_assert_eq!(decryptor.decrypt(&ciphertext), decryptor.embed(value));
    }

    #[test]
    fn prop_additive_homomorphism(a in any::<i32>(), b in any::<i32>()) {
        let decryptor = TestDecryptor::new();
        let key = decryptor.public_key();

        let c1: BigUint = encrypt(&key, i64::from(a)).parse().unwrap();
        let c2: BigUint = encrypt(&key, i64::from(b)).parse().unwrap();

        // The aggregation the server performs: multiply ciphertexts mod n².
        let aggregated = (&c1 * &c2) % &decryptor.n_squared;
        let sum = decryptor.decrypt(&aggregated.to_string());

        prop_assert_eq!(sum, decryptor.embed(i64::from(a) + i64::from(b)));
    }

    #[test]
    fn prop_encryption_is_probabilistic(value in any::<i64>()) {
        let decryptor = TestDecryptor::new();
        let key = decryptor.public_key();

        prop_assert_ne!(encrypt(&key, value), encrypt(&key, value));
    }
}

#[test]
fn negative_values_wrap_modulo_n() {
    let decryptor = TestDecryptor::new();
    let key = decryptor.public_key();

    let ciphertext = encrypt(&key, -5);

    assert_eq!(decryptor.decrypt(&ciphertext), &decryptor.n - 5u32);
}
