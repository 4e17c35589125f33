//! Signed plaintext encoding into `Z_n`.
//!
//! ```text
//! 0 ........ max_int | guard band | n - max_int ........ n - 1
//!   positive values  |  overflow  |      negative values
//! ```

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::error::CryptoError;

/// Largest magnitude representable for modulus `n` (`n / 3 - 1`).
pub(crate) fn max_int_for(n: &BigUint) -> BigUint {
    let third = n / 3u32;
    if third.is_zero() { third } else { third - BigUint::one() }
}

/// Map a signed value into `[0, n)`.
pub(crate) fn encode(
    value: &BigInt,
    n: &BigUint,
    max_int: &BigUint,
) -> Result<BigUint, CryptoError> {
    let magnitude = value.magnitude();
    if magnitude > max_int {
        return Err(CryptoError::Encoding {
            value: value.to_string(),
            max_int: max_int.to_string(),
        });
    }

    match value.sign() {
        Sign::Minus => Ok(n - magnitude),
        Sign::NoSign | Sign::Plus => Ok(magnitude.clone()),
    }
}

/// Map a residue in `[0, n)` back to a signed value.
pub(crate) fn decode(
    residue: &BigUint,
    n: &BigUint,
    max_int: &BigUint,
) -> Result<BigInt, CryptoError> {
    if residue >= n {
        return Err(CryptoError::Decryption { reason: "residue not reduced mod n".to_string() });
    }

    if residue <= max_int {
        return Ok(BigInt::from_biguint(Sign::Plus, residue.clone()));
    }

    let negative_floor = n - max_int;
    if *residue >= negative_floor {
        let magnitude = n - residue;
        return Ok(BigInt::from_biguint(Sign::Minus, magnitude));
    }

    Err(CryptoError::Decryption { reason: "plaintext overflowed the signed window".to_string() })
}
