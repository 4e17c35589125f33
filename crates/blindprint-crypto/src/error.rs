//! Error types for Paillier operations.

use thiserror::Error;

use crate::keys::KeyFingerprint;

/// Errors that can occur during key generation, encryption, homomorphic
/// evaluation or decryption.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key generation failed (invalid modulus size or prime search gave up).
    ///
    /// Fatal. Retrying with the same parameters is not expected to help.
    #[error("key generation failed: {reason}")]
    KeyGeneration {
        /// Why generation failed
        reason: String,
    },

    /// Value cannot be represented in the signed plaintext space
    #[error("value {value} outside plaintext range [-{max_int}, {max_int}]")]
    Encoding {
        /// Offending value (decimal)
        value: String,
        /// Largest representable magnitude (decimal)
        max_int: String,
    },

    /// Ciphertext was produced under a different public key
    #[error("key mismatch: expected key {expected}, ciphertext is under {found}")]
    KeyMismatch {
        /// Fingerprint of the key performing the operation
        expected: KeyFingerprint,
        /// Fingerprint recorded in the ciphertext
        found: KeyFingerprint,
    },

    /// Ciphertext is malformed or decrypts outside the signed window
    #[error("decryption failed: {reason}")]
    Decryption {
        /// Why decryption failed
        reason: String,
    },
}
