//! Additive blinding of encrypted distances.
//!
//! Before a distance ciphertext leaves the server it is shifted by a fresh
//! uniform mask: `Enc(d) ⊕ Enc(m) = Enc(d + m)`. The decrypting party sees
//! only `d + m` until it is handed `m`. Masks travel separately from the
//! masked ciphertexts; [`split_batch`] separates a reply into the two
//! halves and [`join_batch`] reunites them on the client.

use blindprint_crypto::{BigInt, Ciphertext, PublicKey};
use rand::{CryptoRng, Rng, RngCore};

use crate::{
    config::ProtocolConfig,
    error::{LabeledResult, ProtocolError},
};

/// Plaintext blinding value for one distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mask(u64);

impl Mask {
    /// Wrap an explicit mask value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Mask value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// The half of a [`MaskedDistance`] sent to the decrypting party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedCiphertext {
    /// Database label of the entry
    pub label: String,
    /// `Enc(distance + mask)`
    pub ciphertext: Ciphertext,
}

/// Masked encrypted distance with its mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedDistance {
    /// Database label of the entry
    pub label: String,
    /// `Enc(distance + mask)`
    pub ciphertext: Ciphertext,
    /// Value to subtract after decryption
    pub mask: Mask,
}

impl MaskedDistance {
    /// Separate the transmitted ciphertext from the locally retained mask.
    pub fn split(self) -> (MaskedCiphertext, Mask) {
        (MaskedCiphertext { label: self.label, ciphertext: self.ciphertext }, self.mask)
    }

    /// Reunite a received ciphertext with its mask.
    pub fn join(masked: MaskedCiphertext, mask: Mask) -> Self {
        Self { label: masked.label, ciphertext: masked.ciphertext, mask }
    }
}

/// Separate a masked batch into the ciphertext reply and the positional
/// mask list. Failed entries have no mask.
pub fn split_batch(
    masked: Vec<LabeledResult<MaskedDistance>>,
) -> (Vec<LabeledResult<MaskedCiphertext>>, Vec<Option<Mask>>) {
    masked
        .into_iter()
        .map(|entry| match entry.result {
            Ok(distance) => {
                let (sent, mask) = distance.split();
                (LabeledResult::ok(entry.label, sent), Some(mask))
            },
            Err(e) => (LabeledResult::err(entry.label, e), None),
        })
        .unzip()
}

/// Pair each received ciphertext with the mask at the same position.
///
/// A successful ciphertext without a mask becomes a `Decryption` failure
/// for that entry.
///
/// # Errors
///
/// - `Config`: the two lists differ in length (fatal)
pub fn join_batch(
    ciphertexts: Vec<LabeledResult<MaskedCiphertext>>,
    masks: &[Option<Mask>],
) -> Result<Vec<LabeledResult<MaskedDistance>>, ProtocolError> {
    if ciphertexts.len() != masks.len() {
        return Err(ProtocolError::Config(format!(
            "reply has {} ciphertexts but {} masks",
            ciphertexts.len(),
            masks.len()
        )));
    }

    Ok(ciphertexts
        .into_iter()
        .zip(masks)
        .map(|(entry, mask)| {
            let label = entry.label.clone();
            entry.and_then(|sent| match mask {
                Some(mask) => Ok(MaskedDistance::join(sent, *mask)),
                None => Err(ProtocolError::Decryption(format!("entry '{label}': no mask"))),
            })
        })
        .collect())
}

/// Add `Enc(mask)` to `ciphertext`.
///
/// # Errors
///
/// - `KeyMismatch`: `ciphertext` not under `pk`
pub fn apply_mask<R: CryptoRng + RngCore>(
    ciphertext: &Ciphertext,
    mask: Mask,
    pk: &PublicKey,
    rng: &mut R,
) -> Result<Ciphertext, ProtocolError> {
    let encrypted_mask = pk.encrypt(&BigInt::from(mask.value()), rng)?;
    Ok(pk.add(ciphertext, &encrypted_mask)?)
}

/// Blind every successful distance with a fresh mask from
/// `[config.mask_min, config.mask_max)`.
///
/// Failed entries pass through unchanged, so output order and labels match
/// the input.
///
/// # Errors
///
/// - `Config`: invalid mask range (fatal)
pub fn mask_distances<R: CryptoRng + RngCore>(
    distances: Vec<LabeledResult<Ciphertext>>,
    pk: &PublicKey,
    config: &ProtocolConfig,
    rng: &mut R,
) -> Result<Vec<LabeledResult<MaskedDistance>>, ProtocolError> {
    config.validate_mask_range()?;

    let masked: Vec<_> = distances
        .into_iter()
        .map(|entry| {
            let label = entry.label.clone();
            entry.and_then(|ciphertext| {
                let mask = Mask(rng.gen_range(config.mask_min..config.mask_max));
                let ciphertext = apply_mask(&ciphertext, mask, pk, rng)?;
                Ok(MaskedDistance { label, ciphertext, mask })
            })
        })
        .collect();

    tracing::debug!(
        entries = masked.len(),
        mask_min = config.mask_min,
        mask_max = config.mask_max,
        "masked encrypted distances"
    );

    Ok(masked)
}
