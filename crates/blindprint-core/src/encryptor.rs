//! Client-side query encryption.
//!
//! The query is encrypted exactly once per session and then shared
//! read-only with every database comparison.

use blindprint_crypto::{BigInt, Ciphertext, KeyFingerprint, PublicKey};
use rand::{CryptoRng, RngCore};

use crate::{config::DistanceMode, error::ProtocolError, vector::PlainVector};

/// Element-wise encryption of a [`PlainVector`]; index `i` encrypts `a_i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedVector(Vec<Ciphertext>);

impl EncryptedVector {
    /// Number of encrypted elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ciphertexts in element order.
    pub fn as_slice(&self) -> &[Ciphertext] {
        &self.0
    }
}

/// What the client sends to the server: the encrypted vector, plus
/// `Enc(Σa_i²)` when the server is to evaluate the corrected distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedQuery {
    elements: EncryptedVector,
    self_term: Option<Ciphertext>,
}

impl EncryptedQuery {
    /// Encrypted query elements.
    pub fn elements(&self) -> &EncryptedVector {
        &self.elements
    }

    /// `Enc(Σa_i²)`, present only for corrected-mode queries.
    pub fn self_term(&self) -> Option<&Ciphertext> {
        self.self_term.as_ref()
    }

    /// Query length `N`.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if the query has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Fail unless every ciphertext in the query is under `pk`.
    pub fn check_key(&self, pk: &PublicKey) -> Result<(), ProtocolError> {
        self.elements
            .as_slice()
            .iter()
            .chain(self.self_term.as_ref())
            .try_for_each(|c| pk.check_key(c))
            .map_err(ProtocolError::from)
    }

    /// Fingerprint of the key the query was encrypted under, if non-empty.
    pub fn key(&self) -> Option<KeyFingerprint> {
        self.elements.as_slice().first().map(Ciphertext::key)
    }
}

/// Encrypt every element of `vector` under `pk`, preserving order.
///
/// # Errors
///
/// - `Encoding`: an element lies outside the plaintext space (reported with
///   its index)
pub fn encrypt_vector<R: CryptoRng + RngCore>(
    vector: &PlainVector,
    pk: &PublicKey,
    rng: &mut R,
) -> Result<EncryptedVector, ProtocolError> {
    vector
        .as_slice()
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            pk.encrypt_i64(value, rng)
                .map_err(|e| ProtocolError::Encoding(format!("element {i}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(EncryptedVector)
}

/// Encrypt a query for the given distance mode.
///
/// In [`DistanceMode::Corrected`] the client also encrypts `Σa_i²`, the one
/// term the server cannot produce from ciphertexts with additions and
/// plaintext multiplications alone.
pub fn encrypt_query<R: CryptoRng + RngCore>(
    vector: &PlainVector,
    pk: &PublicKey,
    mode: DistanceMode,
    rng: &mut R,
) -> Result<EncryptedQuery, ProtocolError> {
    let elements = encrypt_vector(vector, pk, rng)?;

    let self_term = match mode {
        DistanceMode::Legacy => None,
        DistanceMode::Corrected => {
            let sum: BigInt = vector.sum_of_squares();
            Some(pk.encrypt(&sum, rng)?)
        },
    };

    tracing::debug!(
        len = elements.len(),
        %mode,
        key = %pk.fingerprint(),
        "encrypted query"
    );

    Ok(EncryptedQuery { elements, self_term })
}
