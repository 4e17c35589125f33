//! Protocol configuration.

use std::{fmt, str::FromStr};

use blindprint_crypto::KeyConfig;

use crate::error::ProtocolError;

/// Smallest mask drawn by default.
pub const DEFAULT_MASK_MIN: u64 = 1;

/// Exclusive upper bound for masks drawn by default.
pub const DEFAULT_MASK_MAX: u64 = 100_000;

/// Which distance the server evaluates.
///
/// `Legacy` accumulates `Σ(-2·a_i·b_i) + Σb_i²` only. The client's `Σa_i²`
/// is missing, so the value is the true squared distance shifted by a
/// per-query constant: rankings across one query are unaffected, absolute
/// values are not distances.
///
/// `Corrected` also adds the client-supplied `Enc(Σa_i²)` and yields the
/// full squared Euclidean distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistanceMode {
    /// Cross term plus database self-term only
    #[default]
    Legacy,
    /// Full squared Euclidean distance
    Corrected,
}

impl fmt::Display for DistanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Corrected => f.write_str("corrected"),
        }
    }
}

impl FromStr for DistanceMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "corrected" => Ok(Self::Corrected),
            other => Err(ProtocolError::Config(format!("unknown distance mode '{other}'"))),
        }
    }
}

/// Configuration shared by client and server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Paillier key parameters
    pub key: KeyConfig,
    /// Distance formula evaluated by the server
    pub mode: DistanceMode,
    /// Smallest mask value (inclusive, at least 1)
    pub mask_min: u64,
    /// Mask upper bound (exclusive)
    pub mask_max: u64,
    /// Evaluate database entries on the rayon pool
    pub parallel: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            key: KeyConfig::default(),
            mode: DistanceMode::default(),
            mask_min: DEFAULT_MASK_MIN,
            mask_max: DEFAULT_MASK_MAX,
            parallel: true,
        }
    }
}

impl ProtocolConfig {
    /// Reject unusable parameters before any work is done.
    ///
    /// # Errors
    ///
    /// - `KeyGeneration`: invalid key size
    /// - `Config`: empty or zero-based mask range
    pub fn validate(&self) -> Result<(), ProtocolError> {
        self.key.validate()?;
        self.validate_mask_range()
    }

    /// Check only the mask range; the masking party never generates keys.
    pub fn validate_mask_range(&self) -> Result<(), ProtocolError> {
        if self.mask_min == 0 {
            return Err(ProtocolError::Config("mask_min must be at least 1".to_string()));
        }
        if self.mask_min >= self.mask_max {
            return Err(ProtocolError::Config(format!(
                "empty mask range [{}, {})",
                self.mask_min, self.mask_max
            )));
        }
        Ok(())
    }
}
