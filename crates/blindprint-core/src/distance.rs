//! Homomorphic squared-distance evaluation (server side).
//!
//! For a database vector `b` and encrypted query `A = (Enc(a_0), …)`:
//!
//! ```text
//! acc = Enc(0)
//! for i in 0..N:
//!     acc ⊕= Enc(a_i) ⊗ (-2·b_i)      cross term
//!     acc ⊕= Enc(b_i²)                 database self-term, fresh encryption
//! corrected mode only:
//!     acc ⊕= Enc(Σa_i²)                client self-term
//! ```
//!
//! `Σ(a_i - b_i)² = Σa_i² - 2Σa_i·b_i + Σb_i²`; legacy mode leaves out the
//! first term.
//!
//! # Parallelism
//!
//! Entries are independent. Before fanning out, one 32-byte seed per entry is
//! drawn from the caller's CSPRNG and each entry encrypts from its own
//! ChaCha20 stream, so results are identical in sequential and parallel mode
//! and the output always follows database order.

use blindprint_crypto::{BigInt, Ciphertext, PublicKey};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use crate::{
    config::{DistanceMode, ProtocolConfig},
    encryptor::EncryptedQuery,
    error::{LabeledResult, ProtocolError},
    vector::LabeledVector,
};

/// Evaluate the encrypted distance between `query` and every database entry.
///
/// Returns one [`LabeledResult`] per entry in input order. An entry whose
/// length differs from the query yields `LengthMismatch` and the batch
/// continues.
///
/// # Errors
///
/// Fatal, for the whole batch:
/// - `KeyMismatch`: query was not encrypted under `pk`
/// - `MissingSelfTerm`: corrected mode and the query carries no `Enc(Σa_i²)`
pub fn compute_encrypted_squared_distances<R: CryptoRng + RngCore>(
    query: &EncryptedQuery,
    database: &[LabeledVector],
    pk: &PublicKey,
    config: &ProtocolConfig,
    rng: &mut R,
) -> Result<Vec<LabeledResult<Ciphertext>>, ProtocolError> {
    query.check_key(pk)?;
    match (config.mode, query.self_term().is_some()) {
        (DistanceMode::Corrected, false) => return Err(ProtocolError::MissingSelfTerm),
        (DistanceMode::Legacy, true) => {
            tracing::warn!("query carries Enc(Σa_i²) but legacy mode ignores it");
        },
        _ => {},
    }

    let seeds: Vec<[u8; 32]> = database
        .iter()
        .map(|_| {
            let mut seed = [0u8; 32];
            rng.fill_bytes(&mut seed);
            seed
        })
        .collect();

    let evaluate = |(entry, seed): (&LabeledVector, &[u8; 32])| {
        let mut entry_rng = ChaCha20Rng::from_seed(*seed);
        let result =
            compute_encrypted_squared_distance(query, entry, pk, config.mode, &mut entry_rng);

        if let Err(e) = &result {
            tracing::warn!(label = %entry.label, error = %e, "skipping database entry");
        }
        LabeledResult { label: entry.label.clone(), result }
    };

    let outcomes: Vec<_> = if config.parallel {
        database.par_iter().zip(seeds.par_iter()).map(evaluate).collect()
    } else {
        database.iter().zip(seeds.iter()).map(evaluate).collect()
    };

    tracing::debug!(
        entries = outcomes.len(),
        failed = outcomes.iter().filter(|o| !o.is_ok()).count(),
        mode = %config.mode,
        "evaluated encrypted distances"
    );

    Ok(outcomes)
}

/// Evaluate the encrypted distance for a single entry.
///
/// # Errors
///
/// - `LengthMismatch`: `entry` length differs from the query
/// - `Encoding`: `-2·b_i` or `b_i²` exceeds the plaintext space
/// - `MissingSelfTerm`: corrected mode without `Enc(Σa_i²)`
/// - `KeyMismatch`: query not under `pk`
pub fn compute_encrypted_squared_distance<R: CryptoRng + RngCore>(
    query: &EncryptedQuery,
    entry: &LabeledVector,
    pk: &PublicKey,
    mode: DistanceMode,
    rng: &mut R,
) -> Result<Ciphertext, ProtocolError> {
    let b = entry.vector.as_slice();
    if b.len() != query.len() {
        return Err(ProtocolError::LengthMismatch {
            label: entry.label.clone(),
            expected: query.len(),
            actual: b.len(),
        });
    }

    let mut acc = pk.encrypt(&BigInt::from(0), rng)?;

    for (enc_a, &b_i) in query.elements().as_slice().iter().zip(b) {
        let b_i = i128::from(b_i);

        let cross = pk.mul_scalar(enc_a, &BigInt::from(-2 * b_i))?;
        acc = pk.add(&acc, &cross)?;

        let square = pk.encrypt(&BigInt::from(b_i * b_i), rng)?;
        acc = pk.add(&acc, &square)?;
    }

    if mode == DistanceMode::Corrected {
        let self_term = query.self_term().ok_or(ProtocolError::MissingSelfTerm)?;
        acc = pk.add(&acc, self_term)?;
    }

    Ok(acc)
}
