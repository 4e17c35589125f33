//! Error types for the distance protocol.
//!
//! Fatal errors (key generation, configuration, key mismatch between the
//! query and the evaluation key) abort the pipeline. Per-entry errors
//! (length mismatch, encoding of one database vector, decryption of one
//! distance) are carried in a [`LabeledResult`] next to the entry's label.

use blindprint_crypto::CryptoError;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur while running the distance protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Entropy or parameter failure during key generation
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Value outside the plaintext space. Caller must re-quantize.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// Database vector length differs from the query length
    #[error("length mismatch for '{label}': query has {expected} elements, entry has {actual}")]
    LengthMismatch {
        /// Label of the offending database entry
        label: String,
        /// Query length
        expected: usize,
        /// Entry length
        actual: usize,
    },

    /// Ciphertext produced under a different public key
    #[error("key mismatch: {0}")]
    KeyMismatch(String),

    /// Wrong key, corrupted ciphertext or plaintext overflow
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Corrected distance mode without the client-supplied `Enc(Σa_i²)`
    #[error("corrected distance mode requires the encrypted query self-term")]
    MissingSelfTerm,

    /// Invalid protocol configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Feature store failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProtocolError {
    /// Returns true if this error aborts the whole pipeline.
    ///
    /// Non-fatal errors describe a single database entry; the remaining
    /// entries are still processed.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::LengthMismatch { .. } | Self::Encoding(_) | Self::Decryption(_))
    }
}

impl From<CryptoError> for ProtocolError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::KeyGeneration { reason } => Self::KeyGeneration(reason),
            err @ CryptoError::Encoding { .. } => Self::Encoding(err.to_string()),
            err @ CryptoError::KeyMismatch { .. } => Self::KeyMismatch(err.to_string()),
            CryptoError::Decryption { reason } => Self::Decryption(reason),
        }
    }
}

/// Outcome for one database entry, tagged with its label.
///
/// Batches are always returned in database order, one `LabeledResult` per
/// entry, whether the entry succeeded or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledResult<T> {
    /// Database label of the entry
    pub label: String,
    /// Value for this entry, or the error that stopped it
    pub result: Result<T, ProtocolError>,
}

impl<T> LabeledResult<T> {
    /// Successful entry.
    pub fn ok(label: impl Into<String>, value: T) -> Self {
        Self { label: label.into(), result: Ok(value) }
    }

    /// Failed entry.
    pub fn err(label: impl Into<String>, error: ProtocolError) -> Self {
        Self { label: label.into(), result: Err(error) }
    }

    /// Apply a fallible step to a successful entry; failed entries pass
    /// through untouched.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Result<U, ProtocolError>) -> LabeledResult<U> {
        LabeledResult { label: self.label, result: self.result.and_then(f) }
    }

    /// Borrowing variant of [`LabeledResult::and_then`].
    pub fn map_ref<U>(&self, f: impl FnOnce(&T) -> Result<U, ProtocolError>) -> LabeledResult<U> {
        let result = match &self.result {
            Ok(value) => f(value),
            Err(e) => Err(e.clone()),
        };
        LabeledResult { label: self.label.clone(), result }
    }

    /// True if this entry carries a value.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_entry_errors_are_not_fatal() {
        let mismatch = ProtocolError::LengthMismatch { label: "a".into(), expected: 5, actual: 6 };
        assert!(!mismatch.is_fatal());
        assert!(!ProtocolError::Decryption("bad".into()).is_fatal());
    }

    #[test]
    fn configuration_errors_are_fatal() {
        assert!(ProtocolError::Config("mask range".into()).is_fatal());
        assert!(ProtocolError::KeyGeneration("entropy".into()).is_fatal());
        assert!(ProtocolError::MissingSelfTerm.is_fatal());
    }

    #[test]
    fn crypto_key_generation_maps_to_key_generation() {
        let err: ProtocolError =
            CryptoError::KeyGeneration { reason: "too small".to_string() }.into();
        assert_eq!(err, ProtocolError::KeyGeneration("too small".to_string()));
    }

    #[test]
    fn and_then_skips_failed_entries() {
        let failed: LabeledResult<i32> =
            LabeledResult::err("x", ProtocolError::Decryption("bad".into()));
        let mapped = failed.and_then(|v| Ok(v + 1));

        assert_eq!(mapped.label, "x");
        assert!(!mapped.is_ok());
    }

    #[test]
    fn length_mismatch_message_names_the_label() {
        let err = ProtocolError::LengthMismatch { label: "fp_002".into(), expected: 5, actual: 6 };
        assert!(err.to_string().contains("fp_002"));
    }
}
