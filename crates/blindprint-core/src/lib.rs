//! Blindprint secure distance protocol.
//!
//! A client holding a fingerprint feature vector learns the squared distance
//! to every enrolled vector without revealing its vector to the database
//! operator. The operator only ever sees Paillier ciphertexts under the
//! client's public key.
//!
//! # Pipeline
//!
//! ```text
//! client                                server
//! ──────                                ──────
//! ClientSession::start (keygen)
//!        │ public key ───────────────────────────▶
//! encrypt_query                         │
//!        │ EncryptedQuery ───────────────────────▶
//!                                       compute_encrypted_squared_distances
//!                                       mask_distances
//!                                       split_batch
//!        ◀─────────────────── MaskedCiphertext (reply)
//!        ◀─────────────────── Mask (separate channel)
//! join_batch
//! decrypt_and_unmask
//!        │
//!        ▼
//! (label, squared distance) in database order → rank
//! ```
//!
//! Every batch result is a [`LabeledResult`]: per-entry failures (length
//! mismatch, decryption failure) stay attached to their label and never abort
//! the rest of the batch. Key-generation and configuration errors are fatal
//! and come back as the outer `Err`.
//!
//! The keypair is always an explicit value. Nothing here holds process-wide
//! key state, so independent sessions can run side by side.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod distance;
pub mod encryptor;
mod error;
pub mod masking;
pub mod recovery;
pub mod session;
pub mod storage;
pub mod vector;

pub use blindprint_crypto::{BigInt, Ciphertext, KeyConfig, PrivateKey, PublicKey};
pub use config::{DistanceMode, ProtocolConfig};
pub use distance::{compute_encrypted_squared_distance, compute_encrypted_squared_distances};
pub use encryptor::{EncryptedQuery, EncryptedVector, encrypt_query, encrypt_vector};
pub use error::{LabeledResult, ProtocolError};
pub use masking::{
    Mask, MaskedCiphertext, MaskedDistance, apply_mask, join_batch, mask_distances, split_batch,
};
pub use recovery::{decrypt_and_unmask, rank, unmask};
pub use session::{ClientSession, MatchServer, run_match};
pub use storage::{FeatureStore, MemoryFeatureStore, RedbFeatureStore, StorageError};
pub use vector::{LabeledVector, PlainVector};
