//! Paillier key types.
//!
//! The generator is fixed to `g = n + 1`, which turns `g^m mod n²` into the
//! single multiplication `1 + m·n`.

use std::fmt;

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{
    ciphertext::Ciphertext,
    encoding::{decode, encode, max_int_for},
    error::CryptoError,
};

/// SHA-256 of the big-endian public modulus.
///
/// Identifies a keypair without revealing anything beyond the public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyFingerprint([u8; 32]);

impl KeyFingerprint {
    fn of_modulus(n: &BigUint) -> Self {
        let digest = Sha256::digest(n.to_bytes_be());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyFingerprint({self})")
    }
}

/// Paillier public key `(n, g = n + 1)`.
///
/// Shared read-only by every party. Supports encryption and the two
/// homomorphic operations; cannot decrypt.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    n: BigUint,
    n_squared: BigUint,
    max_int: BigUint,
    fingerprint: KeyFingerprint,
}

impl PublicKey {
    pub(crate) fn from_modulus(n: BigUint) -> Self {
        let n_squared = &n * &n;
        let max_int = max_int_for(&n);
        let fingerprint = KeyFingerprint::of_modulus(&n);
        Self { n, n_squared, max_int, fingerprint }
    }

    /// Public modulus `n`.
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// Bit length of the public modulus.
    pub fn modulus_bits(&self) -> u64 {
        self.n.bits()
    }

    /// Largest plaintext magnitude this key can encrypt.
    pub fn max_int(&self) -> &BigUint {
        &self.max_int
    }

    /// Fingerprint stamped onto every ciphertext produced under this key.
    pub fn fingerprint(&self) -> KeyFingerprint {
        self.fingerprint
    }

    /// Encrypt a signed integer.
    ///
    /// Computes `(1 + m·n) · r^n mod n²` with a fresh unit `r`.
    ///
    /// # Errors
    ///
    /// - `Encoding`: `|value| > max_int`
    pub fn encrypt<R: CryptoRng + RngCore>(
        &self,
        value: &BigInt,
        rng: &mut R,
    ) -> Result<Ciphertext, CryptoError> {
        let m = encode(value, &self.n, &self.max_int)?;
        let nude = (BigUint::one() + &m * &self.n) % &self.n_squared;
        let r = self.random_unit(rng);
        let obfuscator = r.modpow(&self.n, &self.n_squared);

        Ok(Ciphertext::new((nude * obfuscator) % &self.n_squared, self.fingerprint))
    }

    /// Encrypt a machine integer. See [`PublicKey::encrypt`].
    pub fn encrypt_i64<R: CryptoRng + RngCore>(
        &self,
        value: i64,
        rng: &mut R,
    ) -> Result<Ciphertext, CryptoError> {
        self.encrypt(&BigInt::from(value), rng)
    }

    /// Homomorphic addition: result decrypts to `a + b`.
    ///
    /// # Errors
    ///
    /// - `KeyMismatch`: either operand was produced under another key
    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, CryptoError> {
        self.check_key(a)?;
        self.check_key(b)?;

        let sum = (a.raw() * b.raw()) % &self.n_squared;
        Ok(Ciphertext::new(sum, self.fingerprint))
    }

    /// Homomorphic scalar multiplication: result decrypts to `a · k`.
    ///
    /// Negative scalars are taken as `n - |k|`, so the product wraps into the
    /// negative half of the plaintext space.
    ///
    /// # Errors
    ///
    /// - `KeyMismatch`: operand was produced under another key
    /// - `Encoding`: `|k| > max_int`
    pub fn mul_scalar(&self, a: &Ciphertext, k: &BigInt) -> Result<Ciphertext, CryptoError> {
        self.check_key(a)?;

        let exponent = encode(k, &self.n, &self.max_int)?;
        let product = a.raw().modpow(&exponent, &self.n_squared);
        Ok(Ciphertext::new(product, self.fingerprint))
    }

    /// Fail unless `ciphertext` was produced under this key.
    pub fn check_key(&self, ciphertext: &Ciphertext) -> Result<(), CryptoError> {
        if ciphertext.key() == self.fingerprint {
            Ok(())
        } else {
            Err(CryptoError::KeyMismatch { expected: self.fingerprint, found: ciphertext.key() })
        }
    }

    /// Uniform `r ∈ [1, n)` with `gcd(r, n) = 1`.
    ///
    /// A non-unit draw would reveal a factor of `n`; the loop runs more than
    /// once with negligible probability.
    fn random_unit<R: CryptoRng + RngCore>(&self, rng: &mut R) -> BigUint {
        let one = BigUint::one();
        loop {
            let r = rng.gen_biguint_range(&one, &self.n);
            if r.gcd(&self.n).is_one() {
                return r;
            }
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("bits", &self.n.bits())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Paillier private key `(λ, μ)`.
///
/// Held by the client only. Not `Clone`: the session that generated it is
/// its single owner.
pub struct PrivateKey {
    public: PublicKey,
    lambda: BigUint,
    mu: BigUint,
}

impl PrivateKey {
    pub(crate) fn new(public: PublicKey, lambda: BigUint, mu: BigUint) -> Self {
        Self { public, lambda, mu }
    }

    /// Public half of this keypair.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Decrypt to a signed integer.
    ///
    /// `m = L(c^λ mod n²) · μ mod n` with `L(u) = (u - 1) / n`.
    ///
    /// # Errors
    ///
    /// - `KeyMismatch`: ciphertext was produced under another public key
    /// - `Decryption`: ciphertext is `0` or not reduced mod `n²`, or the
    ///   plaintext lies in the overflow band
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<BigInt, CryptoError> {
        self.public.check_key(ciphertext)?;

        let pk = &self.public;
        let c = ciphertext.raw();
        if c.is_zero() || *c >= pk.n_squared {
            return Err(CryptoError::Decryption {
                reason: "ciphertext outside (0, n²)".to_string(),
            });
        }
        if !c.gcd(&pk.n).is_one() {
            return Err(CryptoError::Decryption {
                reason: "ciphertext is not a unit mod n²".to_string(),
            });
        }

        let u = c.modpow(&self.lambda, &pk.n_squared);
        let l = (u - BigUint::one()) / &pk.n;
        let m = (l * &self.mu) % &pk.n;

        decode(&m, &pk.n, &pk.max_int)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("fingerprint", &self.public.fingerprint)
            .finish_non_exhaustive()
    }
}

/// Matching public and private key.
#[derive(Debug)]
pub struct Keypair {
    /// Encryption and homomorphic evaluation
    pub public_key: PublicKey,
    /// Decryption
    pub private_key: PrivateKey,
}

impl Keypair {
    /// Split into `(public, private)`.
    pub fn into_parts(self) -> (PublicKey, PrivateKey) {
        (self.public_key, self.private_key)
    }
}
