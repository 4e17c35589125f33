//! Plaintext feature vectors.
//!
//! Feature extraction yields floating-point FingerCode values (mean Gabor
//! responses per sector, 640 per fingerprint). Paillier encrypts integers, so
//! features are quantized to fixed point with a caller-chosen scale before
//! they reach the protocol. Distances computed over quantized vectors are
//! scaled by `scale²`.

use blindprint_crypto::BigInt;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Number of features produced per fingerprint by the FingerCode extractor.
pub const FINGERCODE_LEN: usize = 640;

/// Default fixed-point scale: two decimal places.
pub const DEFAULT_QUANTIZATION_SCALE: f64 = 100.0;

/// Ordered fixed-point feature vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlainVector(Vec<i64>);

impl PlainVector {
    /// Wrap already-quantized values.
    pub fn new(values: Vec<i64>) -> Self {
        Self(values)
    }

    /// Quantize float features: `round(f · scale)`.
    ///
    /// # Errors
    ///
    /// - `Encoding`: non-finite or non-positive scale, or a feature that is
    ///   not finite or does not fit an `i64` after scaling
    pub fn quantize(features: &[f32], scale: f64) -> Result<Self, ProtocolError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ProtocolError::Encoding(format!("invalid quantization scale {scale}")));
        }

        features
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let scaled = (f64::from(f) * scale).round();
                // i64::MAX as f64 rounds up to 2^63, hence the strict bound
                if scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64 {
                    Ok(scaled as i64)
                } else {
                    Err(ProtocolError::Encoding(format!(
                        "feature {i} ({f}) cannot be quantized at scale {scale}"
                    )))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Elements in order.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// `Σv_i²`, exact.
    pub fn sum_of_squares(&self) -> BigInt {
        self.0.iter().map(|&v| BigInt::from(i128::from(v) * i128::from(v))).sum()
    }

    /// `Σ(a_i - b_i)²` in plaintext, exact. `None` when lengths differ.
    pub fn squared_distance(&self, other: &Self) -> Option<BigInt> {
        if self.len() != other.len() {
            return None;
        }
        Some(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(&a, &b)| {
                    let d = BigInt::from(a) - BigInt::from(b);
                    &d * &d
                })
                .sum(),
        )
    }
}

impl From<Vec<i64>> for PlainVector {
    fn from(values: Vec<i64>) -> Self {
        Self(values)
    }
}

/// Database entry: a label and its feature vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledVector {
    /// Store key, typically the source image name
    pub label: String,
    /// Quantized features
    pub vector: PlainVector,
}

impl LabeledVector {
    /// Pair a label with already-quantized values.
    pub fn new(label: impl Into<String>, values: Vec<i64>) -> Self {
        Self { label: label.into(), vector: PlainVector(values) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_rounds_to_nearest() {
        let v = PlainVector::quantize(&[1.234, -0.5, 127.5], 100.0).unwrap();
        assert_eq!(v.as_slice(), &[123, -50, 12_750]);
    }

    #[test]
    fn quantize_rejects_non_finite_features() {
        let result = PlainVector::quantize(&[1.0, f32::NAN], 100.0);
        assert!(matches!(result, Err(ProtocolError::Encoding(msg)) if msg.contains("feature 1")));
    }

    #[test]
    fn quantize_rejects_bad_scale() {
        assert!(PlainVector::quantize(&[1.0], 0.0).is_err());
        assert!(PlainVector::quantize(&[1.0], f64::INFINITY).is_err());
    }

    #[test]
    fn quantize_rejects_values_beyond_i64() {
        let result = PlainVector::quantize(&[f32::MAX], 1e10);
        assert!(matches!(result, Err(ProtocolError::Encoding(_))));
    }

    #[test]
    fn sum_of_squares_is_exact() {
        let v = PlainVector::new(vec![1, 2, 3]);
        assert_eq!(v.sum_of_squares(), BigInt::from(14));
    }

    #[test]
    fn squared_distance_requires_equal_lengths() {
        let a = PlainVector::new(vec![1, 2, 3]);
        let b = PlainVector::new(vec![4, 6, 3]);
        assert_eq!(a.squared_distance(&b), Some(BigInt::from(25)));
        assert_eq!(a.squared_distance(&PlainVector::new(vec![1])), None);
    }

    #[test]
    fn squared_distance_of_opposite_extremes_is_exact() {
        let a = PlainVector::new(vec![i64::MAX]);
        let b = PlainVector::new(vec![i64::MIN]);

        let d = BigInt::from(u64::MAX);
        assert_eq!(a.squared_distance(&b), Some(&d * &d));
    }
}
