//! Transaction assembly.
//!
//! A proposal stores only an opaque action payload. At execution time the
//! engine combines that payload with the vault identifier and a fresh
//! anti-replay token from the ledger into a [`Transaction`], and a signer
//! backend turns it into a [`SignedTransaction`]. The signing bytes are the
//! CBOR encoding of the transaction, produced by the house serialization
//! helpers so signer and ledger agree on the layout.

use crate::ledger::traits::FreshnessToken;
use crate::serialization::{to_cbor, SerializationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one authorization domain (32 bytes).
///
/// One vault = one member registry = one proposal store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultId([u8; 32]);

impl VaultId {
    /// Create from bytes; only the first 32 are used.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut id = [0u8; 32];
        id.copy_from_slice(&bytes[..32]);
        Self(id)
    }

    /// Get bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for VaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Public identity a signer backend signs under (hex-encoded public key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicIdentity(pub String);

impl fmt::Display for PublicIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully assembled, not yet signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Vault this transaction moves value out of.
    pub vault: VaultId,
    /// Opaque serialized action intent, fixed at proposal creation.
    pub payload: Vec<u8>,
    /// Anti-replay token obtained from the ledger at execution time.
    pub freshness: FreshnessToken,
}

impl Transaction {
    /// Bytes a signer backend signs over.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        to_cbor(self)
    }
}

/// A transaction plus the signature a backend produced over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    /// Identity the backend reported at connect time.
    pub signer: PublicIdentity,
    /// Raw signature bytes over [`Transaction::signing_bytes`].
    pub signature: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction {
            vault: VaultId::from_bytes(&[7u8; 32]),
            payload: b"transfer 100 to acct-9".to_vec(),
            freshness: FreshnessToken(11),
        }
    }

    #[test]
    fn test_vault_id_display_is_hex() {
        let vault = VaultId::from_bytes(&[0xabu8; 32]);
        let shown = vault.to_string();
        assert_eq!(shown.len(), 64);
        assert!(shown.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signing_bytes_stable() {
        let tx = sample_tx();
        assert_eq!(tx.signing_bytes().unwrap(), tx.signing_bytes().unwrap());
    }

    #[test]
    fn test_signing_bytes_cover_freshness() {
        // Two assemblies of the same payload under different tokens must not
        // produce the same signable bytes.
        let a = sample_tx();
        let mut b = sample_tx();
        b.freshness = FreshnessToken(12);
        assert_ne!(a.signing_bytes().unwrap(), b.signing_bytes().unwrap());
    }
}
