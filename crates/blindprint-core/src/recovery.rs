//! Client-side decryption and unmasking.

use blindprint_crypto::{BigInt, PrivateKey};

use crate::{
    error::{LabeledResult, ProtocolError},
    masking::MaskedDistance,
};

/// Decrypt one masked distance and subtract its mask.
///
/// The result is exact: sums over extreme `i64` elements exceed any
/// fixed-width integer but still fit the plaintext space.
///
/// # Errors
///
/// - `Decryption`: wrong key or corrupted ciphertext
pub fn unmask(masked: &MaskedDistance, sk: &PrivateKey) -> Result<BigInt, ProtocolError> {
    let masked_value = sk.decrypt(&masked.ciphertext).map_err(|e| {
        ProtocolError::Decryption(format!("entry '{}': {e}", masked.label))
    })?;

    Ok(masked_value - BigInt::from(masked.mask.value()))
}

/// Decrypt and unmask a batch, preserving order and labels.
///
/// A failing entry yields `Err` in its slot; the others are unaffected.
pub fn decrypt_and_unmask(
    masked: &[LabeledResult<MaskedDistance>],
    sk: &PrivateKey,
) -> Vec<LabeledResult<BigInt>> {
    let recovered: Vec<_> = masked.iter().map(|entry| entry.map_ref(|m| unmask(m, sk))).collect();

    let failed = recovered.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        tracing::warn!(failed, total = recovered.len(), "some distances could not be recovered");
    }

    recovered
}

/// Successful `(label, distance)` pairs, nearest first.
///
/// Ties keep database order.
pub fn rank(results: &[LabeledResult<BigInt>]) -> Vec<(String, BigInt)> {
    let mut ranked: Vec<_> = results
        .iter()
        .filter_map(|r| r.result.as_ref().ok().map(|d| (r.label.clone(), d.clone())))
        .collect();
    ranked.sort_by(|(_, a), (_, b)| a.cmp(b));
    ranked
}

#[cfg(test)]
mod tests {
    use blindprint_crypto::{Ciphertext, KeyConfig, PublicKey, generate_keypair};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::masking::{Mask, apply_mask};

    fn setup(seed: u64) -> (PublicKey, PrivateKey, ChaCha20Rng) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let (pk, sk) =
            generate_keypair(&KeyConfig { modulus_bits: 256 }, &mut rng).unwrap().into_parts();
        (pk, sk, rng)
    }

    fn masked(
        pk: &PublicKey,
        rng: &mut ChaCha20Rng,
        label: &str,
        distance: i64,
        mask: u64,
    ) -> MaskedDistance {
        let c = pk.encrypt_i64(distance, rng).unwrap();
        let mask = Mask::new(mask);
        let ciphertext = apply_mask(&c, mask, pk, rng).unwrap();
        MaskedDistance { label: label.into(), ciphertext, mask }
    }

    #[test]
    fn unmask_recovers_negative_values() {
        let (pk, sk, mut rng) = setup(1);
        let entry = masked(&pk, &mut rng, "fp", -14, 50);

        assert_eq!(unmask(&entry, &sk).unwrap(), BigInt::from(-14));
    }

    #[test]
    fn wrong_key_is_a_decryption_error() {
        let (pk, _, mut rng) = setup(2);
        let (_, other_sk, _) = setup(3);
        let entry = masked(&pk, &mut rng, "fp", 10, 5);

        let result = unmask(&entry, &other_sk);

        assert!(matches!(result, Err(ProtocolError::Decryption(msg)) if msg.contains("fp")));
    }

    #[test]
    fn corrupted_ciphertext_fails_only_its_entry() {
        let (pk, sk, mut rng) = setup(4);
        let mut bad = masked(&pk, &mut rng, "bad", 1, 1);
        bad.ciphertext = Ciphertext::from_raw(0u32.into(), pk.fingerprint());

        let batch = vec![
            LabeledResult::ok("good", masked(&pk, &mut rng, "good", 7, 3)),
            LabeledResult::ok("bad", bad),
        ];

        let recovered = decrypt_and_unmask(&batch, &sk);

        assert_eq!(recovered[0].result, Ok(BigInt::from(7)));
        assert!(matches!(recovered[1].result, Err(ProtocolError::Decryption(_))));
    }

    #[test]
    fn upstream_failures_are_preserved() {
        let (_, sk, _) = setup(5);
        let mismatch = ProtocolError::LengthMismatch { label: "x".into(), expected: 5, actual: 6 };
        let batch = vec![LabeledResult::<MaskedDistance>::err("x", mismatch.clone())];

        let recovered = decrypt_and_unmask(&batch, &sk);

        assert_eq!(recovered, vec![LabeledResult::err("x", mismatch)]);
    }

    #[test]
    fn distances_beyond_i128_are_recovered_exactly() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let (pk, sk) =
            generate_keypair(&KeyConfig { modulus_bits: 512 }, &mut rng).unwrap().into_parts();
        let distance = BigInt::from(i128::MAX) * 64;
        let c = pk.encrypt(&distance, &mut rng).unwrap();
        let mask = Mask::new(99_999);
        let ciphertext = apply_mask(&c, mask, &pk, &mut rng).unwrap();
        let entry = MaskedDistance { label: "e".into(), ciphertext, mask };

        assert_eq!(unmask(&entry, &sk).unwrap(), distance);
    }

    #[test]
    fn rank_sorts_ascending_and_drops_failures() {
        let results = vec![
            LabeledResult::ok("far", BigInt::from(90)),
            LabeledResult::err("broken", ProtocolError::Decryption("x".into())),
            LabeledResult::ok("near", BigInt::from(3)),
            LabeledResult::ok("tie", BigInt::from(90)),
        ];

        let ranked: Vec<_> = rank(&results).into_iter().map(|(label, _)| label).collect();

        assert_eq!(ranked, ["near", "far", "tie"]);
        assert_eq!(rank(&results)[0].1, BigInt::from(3));
    }
}
