//! Development signer.
//!
//! Derives a deterministic Ed25519 key from a BIP-39 mnemonic (or a raw
//! 32-byte seed) via HKDF-SHA256 with domain separation, and signs entirely
//! in-process with `ring`.
//!
//! There is NO security boundary here: the private key lives in this
//! process's memory for the lifetime of a session. Unsafe for production
//! use; it exists for tests, demos, and local development. Seed material is
//! zeroized on drop.

use super::traits::{SignerBackend, SignerError, SignerResult};
use crate::tx::{PublicIdentity, SignedTransaction, Transaction};
use async_trait::async_trait;
use bip39::Mnemonic;
use hkdf::Hkdf;
use ring::signature::{Ed25519KeyPair, KeyPair};
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Domain separation salt for dev key derivation (versioned for rotation).
const DEV_SALT: &[u8] = b"custos-dev-signer-v1";

/// HKDF info string for the Ed25519 seed.
const ED25519_SEED: &[u8] = b"ed25519-seed";

/// Seed construction errors.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Invalid BIP-39 mnemonic.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),
}

/// Root seed material, cleared on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct RootSeed([u8; 64]);

struct Session {
    keypair: Ed25519KeyPair,
    identity: PublicIdentity,
}

/// In-process deterministic signer for development and tests.
pub struct DevSigner {
    seed: RootSeed,
    session: Option<Session>,
}

impl DevSigner {
    /// Derive from a BIP-39 mnemonic phrase (empty passphrase).
    ///
    /// The mnemonic itself is not retained; only the derived seed is.
    pub fn from_mnemonic(mnemonic: &str) -> Result<Self, SeedError> {
        let parsed =
            Mnemonic::parse(mnemonic).map_err(|e| SeedError::InvalidMnemonic(e.to_string()))?;
        Ok(Self {
            seed: RootSeed(parsed.to_seed("")),
            session: None,
        })
    }

    /// Use a raw 32-byte seed directly (test fixtures).
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let mut root = [0u8; 64];
        root[..32].copy_from_slice(&seed);
        Self {
            seed: RootSeed(root),
            session: None,
        }
    }

    /// The identity this signer will report on connect, without opening a
    /// session. Used to register members ahead of time.
    pub fn identity(&self) -> SignerResult<PublicIdentity> {
        let keypair = self.derive_keypair()?;
        Ok(PublicIdentity(hex::encode(keypair.public_key().as_ref())))
    }

    fn derive_keypair(&self) -> SignerResult<Ed25519KeyPair> {
        let hkdf = Hkdf::<Sha256>::new(Some(DEV_SALT), &self.seed.0);
        let mut ed_seed = [0u8; 32];
        hkdf.expand(ED25519_SEED, &mut ed_seed)
            .map_err(|e| SignerError::ConnectFailed(format!("seed derivation: {:?}", e)))?;

        let keypair = Ed25519KeyPair::from_seed_unchecked(&ed_seed)
            .map_err(|e| SignerError::ConnectFailed(format!("keypair: {:?}", e)));
        ed_seed.zeroize();
        keypair
    }
}

#[async_trait]
impl SignerBackend for DevSigner {
    async fn connect(&mut self) -> SignerResult<PublicIdentity> {
        if self.session.is_some() {
            return Err(SignerError::AlreadyConnected);
        }
        let keypair = self.derive_keypair()?;
        let identity = PublicIdentity(hex::encode(keypair.public_key().as_ref()));
        self.session = Some(Session {
            keypair,
            identity: identity.clone(),
        });
        tracing::debug!(%identity, "dev signer session opened");
        Ok(identity)
    }

    async fn sign(&mut self, tx: &Transaction) -> SignerResult<SignedTransaction> {
        let session = self.session.as_ref().ok_or(SignerError::NotConnected)?;
        let bytes = tx
            .signing_bytes()
            .map_err(|e| SignerError::Encoding(e.to_string()))?;
        let signature = session.keypair.sign(&bytes);
        Ok(SignedTransaction {
            transaction: tx.clone(),
            signer: session.identity.clone(),
            signature: signature.as_ref().to_vec(),
        })
    }

    async fn disconnect(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("dev signer session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::traits::FreshnessToken;
    use crate::tx::VaultId;
    use ring::signature::{UnparsedPublicKey, ED25519};

    // Standard BIP-39 test vector mnemonic. Never fund identities derived
    // from it.
    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn sample_tx() -> Transaction {
        Transaction {
            vault: VaultId::from_bytes(&[1u8; 32]),
            payload: b"move 5".to_vec(),
            freshness: FreshnessToken(3),
        }
    }

    #[tokio::test]
    async fn test_identity_is_deterministic() {
        let a = DevSigner::from_seed([9u8; 32]);
        let b = DevSigner::from_seed([9u8; 32]);
        assert_eq!(a.identity().unwrap(), b.identity().unwrap());
    }

    #[tokio::test]
    async fn test_different_seeds_different_identities() {
        let a = DevSigner::from_seed([1u8; 32]);
        let b = DevSigner::from_seed([2u8; 32]);
        assert_ne!(a.identity().unwrap(), b.identity().unwrap());
    }

    #[tokio::test]
    async fn test_mnemonic_construction() {
        let signer = DevSigner::from_mnemonic(TEST_MNEMONIC).unwrap();
        // 32-byte Ed25519 public key, hex-encoded.
        assert_eq!(signer.identity().unwrap().0.len(), 64);
    }

    #[tokio::test]
    async fn test_invalid_mnemonic_rejected() {
        assert!(matches!(
            DevSigner::from_mnemonic("not a mnemonic at all"),
            Err(SeedError::InvalidMnemonic(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_requires_session() {
        let mut signer = DevSigner::from_seed([7u8; 32]);
        let err = signer.sign(&sample_tx()).await.unwrap_err();
        assert!(matches!(err, SignerError::NotConnected));
    }

    #[tokio::test]
    async fn test_double_connect_refused() {
        let mut signer = DevSigner::from_seed([7u8; 32]);
        signer.connect().await.unwrap();
        assert!(matches!(
            signer.connect().await.unwrap_err(),
            SignerError::AlreadyConnected
        ));
    }

    #[tokio::test]
    async fn test_disconnect_idempotent() {
        let mut signer = DevSigner::from_seed([7u8; 32]);
        signer.disconnect().await;
        signer.connect().await.unwrap();
        signer.disconnect().await;
        signer.disconnect().await;
        // Reconnect after disconnect works.
        signer.connect().await.unwrap();
    }

    #[tokio::test]
    async fn test_signature_verifies_under_reported_identity() {
        let mut signer = DevSigner::from_seed([7u8; 32]);
        let identity = signer.connect().await.unwrap();
        let tx = sample_tx();
        let signed = signer.sign(&tx).await.unwrap();
        signer.disconnect().await;

        assert_eq!(signed.signer, identity);
        let public_key = hex::decode(&identity.0).unwrap();
        let verifier = UnparsedPublicKey::new(&ED25519, &public_key);
        verifier
            .verify(&tx.signing_bytes().unwrap(), &signed.signature)
            .expect("signature must verify");
    }

    #[tokio::test]
    async fn test_sign_batch_partial_failure_semantics() {
        // Batch over the default implementation: all succeed here; the
        // early-stop path is covered by the mock signer tests.
        let mut signer = DevSigner::from_seed([7u8; 32]);
        signer.connect().await.unwrap();
        let txs = vec![sample_tx(), sample_tx(), sample_tx()];
        let signed = signer.sign_batch(&txs).await.unwrap();
        assert_eq!(signed.len(), 3);
        signer.disconnect().await;
    }
}
