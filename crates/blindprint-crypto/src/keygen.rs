//! Paillier key generation
//!
//! Two distinct random primes of half the modulus size, each with its top two
//! bits set so that `n = p·q` has exactly the requested bit length.
//! Primality uses `num-prime`'s probabilistic test (Miller-Rabin plus strong
//! Lucas).

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_prime::{PrimalityTestConfig, nt_funcs::is_prime};
use num_traits::One;
use rand::{CryptoRng, RngCore};

use crate::{
    error::CryptoError,
    keys::{Keypair, PrivateKey, PublicKey},
};

/// Default modulus size in bits.
pub const DEFAULT_MODULUS_BITS: usize = 2048;

/// Smallest modulus accepted. Below this the plaintext window cannot hold a
/// masked 640-element distance.
pub const MIN_MODULUS_BITS: usize = 256;

/// Candidates tried per prime before giving up. Expected cost for a 1024-bit
/// prime is a few hundred odd candidates.
const MAX_PRIME_CANDIDATES: usize = 100_000;

/// Attempts at assembling a valid modulus from fresh primes.
const MAX_MODULUS_ATTEMPTS: usize = 16;

/// Key generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyConfig {
    /// Bit length of the public modulus `n`. Must be even.
    pub modulus_bits: usize,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self { modulus_bits: DEFAULT_MODULUS_BITS }
    }
}

impl KeyConfig {
    /// Check parameters without generating anything.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.modulus_bits < MIN_MODULUS_BITS {
            return Err(CryptoError::KeyGeneration {
                reason: format!(
                    "modulus of {} bits is below the {MIN_MODULUS_BITS}-bit minimum",
                    self.modulus_bits
                ),
            });
        }
        if self.modulus_bits % 2 != 0 {
            return Err(CryptoError::KeyGeneration {
                reason: format!("modulus size must be even, got {}", self.modulus_bits),
            });
        }
        Ok(())
    }
}

/// Generate a fresh Paillier keypair.
///
/// `rng` must be a cryptographically secure generator; production callers
/// pass `rand::rngs::OsRng`.
///
/// # Errors
///
/// - `KeyGeneration`: invalid `config`, or prime search / modulus assembly
///   exhausted its attempt budget
pub fn generate_keypair<R: CryptoRng + RngCore>(
    config: &KeyConfig,
    rng: &mut R,
) -> Result<Keypair, CryptoError> {
    config.validate()?;

    let prime_bits = config.modulus_bits / 2;

    for _ in 0..MAX_MODULUS_ATTEMPTS {
        let p = random_prime(prime_bits, rng)?;
        let q = random_prime(prime_bits, rng)?;
        if p == q {
            continue;
        }

        let n = &p * &q;
        if n.bits() as usize != config.modulus_bits {
            continue;
        }

        let lambda = (&p - 1u32) * (&q - 1u32);
        if !n.gcd(&lambda).is_one() {
            continue;
        }

        let Some(mu) = lambda.modinv(&n) else {
            continue;
        };

        let public_key = PublicKey::from_modulus(n);
        let private_key = PrivateKey::new(public_key.clone(), lambda, mu);
        return Ok(Keypair { public_key, private_key });
    }

    Err(CryptoError::KeyGeneration {
        reason: format!("no valid modulus after {MAX_MODULUS_ATTEMPTS} attempts"),
    })
}

/// Random prime of exactly `bits` bits with the second-highest bit set.
fn random_prime<R: CryptoRng + RngCore>(bits: usize, rng: &mut R) -> Result<BigUint, CryptoError> {
    let top_bits = (BigUint::one() << (bits - 1)) | (BigUint::one() << (bits - 2));

    for _ in 0..MAX_PRIME_CANDIDATES {
        let candidate = rng.gen_biguint(bits as u64) | &top_bits | BigUint::one();

        if is_prime(&candidate, Some(PrimalityTestConfig::default())).probably() {
            return Ok(candidate);
        }
    }

    Err(CryptoError::KeyGeneration {
        reason: format!("no {bits}-bit prime after {MAX_PRIME_CANDIDATES} candidates"),
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    #[test]
    fn default_config_is_2048_bits() {
        assert_eq!(KeyConfig::default().modulus_bits, 2048);
    }

    #[test]
    fn generated_modulus_has_requested_size() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let keypair = generate_keypair(&KeyConfig { modulus_bits: 512 }, &mut rng).unwrap();

        assert_eq!(keypair.public_key.modulus_bits(), 512);
    }

    #[test]
    fn private_key_matches_public_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let keypair = generate_keypair(&KeyConfig { modulus_bits: 256 }, &mut rng).unwrap();

        assert_eq!(keypair.private_key.public_key(), &keypair.public_key);
    }

    #[test]
    fn separate_generations_produce_distinct_keys() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let config = KeyConfig { modulus_bits: 256 };

        let a = generate_keypair(&config, &mut rng).unwrap();
        let b = generate_keypair(&config, &mut rng).unwrap();

        assert_ne!(a.public_key.fingerprint(), b.public_key.fingerprint());
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let config = KeyConfig { modulus_bits: 256 };

        let a = generate_keypair(&config, &mut ChaCha20Rng::seed_from_u64(4)).unwrap();
        let b = generate_keypair(&config, &mut ChaCha20Rng::seed_from_u64(4)).unwrap();

        assert_eq!(a.public_key, b.public_key);
    }

    #[test]
    fn undersized_modulus_is_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let result = generate_keypair(&KeyConfig { modulus_bits: 128 }, &mut rng);

        assert!(matches!(result, Err(CryptoError::KeyGeneration { .. })));
    }

    #[test]
    fn odd_modulus_is_rejected() {
        let result = KeyConfig { modulus_bits: 1025 }.validate();

        assert!(matches!(
            result,
            Err(CryptoError::KeyGeneration { reason }) if reason.contains("even")
        ));
    }

    #[test]
    fn random_prime_has_exact_bit_length() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let p = random_prime(128, &mut rng).unwrap();

        assert_eq!(p.bits(), 128);
        assert!(p.is_odd());
    }
}
