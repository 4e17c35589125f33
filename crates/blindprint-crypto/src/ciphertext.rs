//! Paillier ciphertexts.

use std::fmt;

use num_bigint::BigUint;

use crate::keys::KeyFingerprint;

/// Encryption of one signed integer, an element of `Z_{n²}*`.
///
/// Opaque to everyone but the private-key holder. Combine ciphertexts with
/// [`PublicKey::add`](crate::PublicKey::add) and
/// [`PublicKey::mul_scalar`](crate::PublicKey::mul_scalar).
#[derive(Clone, PartialEq, Eq)]
pub struct Ciphertext {
    value: BigUint,
    key: KeyFingerprint,
}

impl Ciphertext {
    pub(crate) fn new(value: BigUint, key: KeyFingerprint) -> Self {
        Self { value, key }
    }

    /// Rebuild a ciphertext received from another party.
    ///
    /// No validation happens here; decryption rejects values outside
    /// `Z_{n²}*`.
    pub fn from_raw(value: BigUint, key: KeyFingerprint) -> Self {
        Self { value, key }
    }

    /// Group element `c`.
    pub fn raw(&self) -> &BigUint {
        &self.value
    }

    /// Fingerprint of the public key this ciphertext was produced under.
    pub fn key(&self) -> KeyFingerprint {
        self.key
    }

    /// Serialized size in bytes (big-endian group element).
    pub fn byte_len(&self) -> usize {
        self.value.bits().div_ceil(8) as usize
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ciphertext")
            .field("bytes", &self.byte_len())
            .field("key", &self.key)
            .finish()
    }
}
