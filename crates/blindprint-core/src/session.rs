//! The two parties of the protocol.
//!
//! [`ClientSession`] owns the keypair for one matching session and never
//! hands out the private key. [`MatchServer`] owns the feature store and
//! only ever sees the public key and ciphertexts.

use blindprint_crypto::{BigInt, PrivateKey, PublicKey, generate_keypair};
use rand::{CryptoRng, RngCore};

use crate::{
    config::ProtocolConfig,
    distance::compute_encrypted_squared_distances,
    encryptor::{self, EncryptedQuery},
    error::{LabeledResult, ProtocolError},
    masking::{MaskedDistance, join_batch, mask_distances, split_batch},
    recovery::decrypt_and_unmask,
    storage::FeatureStore,
    vector::PlainVector,
};

/// Client side of one matching session.
///
/// Generates a fresh keypair on start. Keys are not persisted; dropping the
/// session discards them.
#[derive(Debug)]
pub struct ClientSession {
    public_key: PublicKey,
    private_key: PrivateKey,
    config: ProtocolConfig,
}

impl ClientSession {
    /// Validate `config` and generate the session keypair.
    ///
    /// # Errors
    ///
    /// - `Config`: invalid mask range
    /// - `KeyGeneration`: key size below the minimum, or prime search failed
    pub fn start<R: CryptoRng + RngCore>(
        config: ProtocolConfig,
        rng: &mut R,
    ) -> Result<Self, ProtocolError> {
        config.validate()?;

        let (public_key, private_key) = generate_keypair(&config.key, rng)?.into_parts();

        tracing::info!(
            key = %public_key.fingerprint(),
            modulus_bits = public_key.modulus_bits(),
            mode = %config.mode,
            "client session started"
        );

        Ok(Self { public_key, private_key, config })
    }

    /// Public key to hand to the server.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Session configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Encrypt `vector` for the session's distance mode.
    ///
    /// # Errors
    ///
    /// - `Encoding`: an element (or `Σa_i²`) is outside the plaintext space
    pub fn encrypt_query<R: CryptoRng + RngCore>(
        &self,
        vector: &PlainVector,
        rng: &mut R,
    ) -> Result<EncryptedQuery, ProtocolError> {
        encryptor::encrypt_query(vector, &self.public_key, self.config.mode, rng)
    }

    /// Decrypt and unmask the server's reply, in the order received.
    pub fn recover(
        &self,
        masked: &[LabeledResult<MaskedDistance>],
    ) -> Vec<LabeledResult<BigInt>> {
        decrypt_and_unmask(masked, &self.private_key)
    }
}

/// Server side: evaluates encrypted distances against a feature store.
#[derive(Debug, Clone)]
pub struct MatchServer<S: FeatureStore> {
    store: S,
    config: ProtocolConfig,
}

impl<S: FeatureStore> MatchServer<S> {
    /// Create a server over `store`.
    pub fn new(store: S, config: ProtocolConfig) -> Self {
        Self { store, config }
    }

    /// Underlying feature store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Evaluate and mask the distance from `query` to every enrolled vector.
    ///
    /// Output follows the store's label order, one entry per enrolled
    /// vector. Each entry still carries its mask; [`split_batch`] separates
    /// the ciphertext reply from the masks before delivery.
    ///
    /// # Errors
    ///
    /// Fatal only:
    /// - `Storage`: entries could not be loaded
    /// - `KeyMismatch`, `MissingSelfTerm`: see
    ///   [`compute_encrypted_squared_distances`]
    /// - `Config`: invalid mask range
    pub fn evaluate<R: CryptoRng + RngCore>(
        &self,
        query: &EncryptedQuery,
        pk: &PublicKey,
        rng: &mut R,
    ) -> Result<Vec<LabeledResult<MaskedDistance>>, ProtocolError> {
        let database = self.store.load_all()?;
        tracing::debug!(entries = database.len(), "evaluating query against store");

        let distances =
            compute_encrypted_squared_distances(query, &database, pk, &self.config, rng)?;
        mask_distances(distances, pk, &self.config, rng)
    }
}

/// Run the whole protocol in-process: encrypt, evaluate, mask, recover.
///
/// The reply is split into ciphertexts and masks and rejoined on the client
/// side, as it would be when the two travel over separate channels.
///
/// # Errors
///
/// Any fatal [`ProtocolError`]. Per-entry failures are inside the returned
/// results.
pub fn run_match<S: FeatureStore, R: CryptoRng + RngCore>(
    session: &ClientSession,
    server: &MatchServer<S>,
    vector: &PlainVector,
    rng: &mut R,
) -> Result<Vec<LabeledResult<BigInt>>, ProtocolError> {
    let query = session.encrypt_query(vector, rng)?;
    let (reply, masks) = split_batch(server.evaluate(&query, session.public_key(), rng)?);
    let masked = join_batch(reply, &masks)?;
    Ok(session.recover(&masked))
}
