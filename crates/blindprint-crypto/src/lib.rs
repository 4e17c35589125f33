//! Blindprint Cryptographic Primitives
//!
//! Paillier public-key encryption: the additively homomorphic scheme the
//! distance protocol is built on. Functions never reach for an ambient RNG;
//! callers pass a cryptographically secure generator so tests can run with a
//! seeded one.
//!
//! # Homomorphic Operations
//!
//! ```text
//! Enc(a) ⊕ Enc(b)  = Enc(a) · Enc(b) mod n²   → decrypts to a + b
//! Enc(a) ⊗ k       = Enc(a)^k mod n²          → decrypts to a · k
//! ```
//!
//! Plaintexts are signed integers. Values in `[0, max_int]` encode as
//! themselves and values in `[-max_int, 0)` encode as `n + v`, leaving a
//! guard band in the middle of `Z_n` that decryption rejects as overflow.
//!
//! # Key Lifecycle
//!
//! Keys are ephemeral. A [`Keypair`] is generated at session start, split
//! into its public half (shared read-only with every party) and its private
//! half (kept by the client), and dropped when the session ends. Nothing in
//! this crate persists key material.
//!
//! # Security
//!
//! - Encryption is randomized: every call draws a fresh unit `r ∈ Z_n*`
//! - Every ciphertext carries the fingerprint of the key that produced it;
//!   mixing keys is reported as [`CryptoError::KeyMismatch`] instead of
//!   silently producing garbage
//! - Honest-but-curious model only: ciphertexts are malleable

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod ciphertext;
mod encoding;
mod error;
pub mod keygen;
mod keys;

pub use ciphertext::Ciphertext;
pub use error::CryptoError;
pub use keygen::{DEFAULT_MODULUS_BITS, KeyConfig, MIN_MODULUS_BITS, generate_keypair};
pub use keys::{KeyFingerprint, Keypair, PrivateKey, PublicKey};
pub use num_bigint::BigInt;
