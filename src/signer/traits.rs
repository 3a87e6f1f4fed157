//! Signer backend abstraction.
//!
//! The engine is agnostic to where signatures come from: an in-memory
//! development key, a hardware module, or a remote signing service. All of
//! them implement [`SignerBackend`], a connect → sign → disconnect lifecycle
//! over `&mut self`. One backend instance belongs to exactly one execution
//! at a time, so concurrent sign/disconnect on a shared instance is
//! unrepresentable.
//!
//! No private key material ever crosses this boundary: backends take
//! signing bytes in and hand signatures back.

use crate::tx::{PublicIdentity, SignedTransaction, Transaction};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for signer operations.
pub type SignerResult<T> = Result<T, SignerError>;

/// Signer backend errors.
#[derive(Debug, Error)]
pub enum SignerError {
    /// Backend unreachable or authentication failed.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// `connect` called twice without an intervening `disconnect`.
    #[error("already connected")]
    AlreadyConnected,

    /// `sign` called outside a session.
    #[error("not connected")]
    NotConnected,

    /// Backend refused to sign (policy violation, hardware error). Never
    /// retried.
    #[error("signing rejected by backend: {0}")]
    Rejected(String),

    /// Backend did not answer in time. Transient; the same request may be
    /// retried.
    #[error("signing timed out: {0}")]
    Timeout(String),

    /// The transaction could not be encoded into signing bytes.
    #[error("transaction encoding failed: {0}")]
    Encoding(String),
}

impl SignerError {
    /// Whether retrying the same operation is documented safe.
    pub fn is_transient(&self) -> bool {
        matches!(self, SignerError::Timeout(_))
    }
}

/// Outcome of a batch signing run that stopped early.
///
/// Holds everything signed before the failure; callers must not assume
/// all-or-nothing unless a specific backend documents atomic batches.
#[derive(Debug, Error)]
#[error("batch signing stopped at transaction {failed_at}: {error}")]
pub struct BatchFailure {
    pub signed: Vec<SignedTransaction>,
    pub failed_at: usize,
    #[source]
    pub error: SignerError,
}

/// Uniform contract for producing signatures over assembled transactions.
///
/// Lifecycle: Disconnected → `connect` → Connected → `disconnect` →
/// Disconnected. `disconnect` is idempotent and infallible; callers invoke
/// it on every exit path, including signing failures, so no backend
/// session leaks.
#[async_trait]
pub trait SignerBackend: Send {
    /// Establish a session and return the identity used for signatures.
    async fn connect(&mut self) -> SignerResult<PublicIdentity>;

    /// Sign one assembled transaction. Requires a session; may suspend for
    /// a backend-defined duration (hardware round-trip).
    async fn sign(&mut self, tx: &Transaction) -> SignerResult<SignedTransaction>;

    /// Sign several transactions sequentially, stopping at the first
    /// failure and returning the partial results with the error.
    async fn sign_batch(
        &mut self,
        txs: &[Transaction],
    ) -> Result<Vec<SignedTransaction>, BatchFailure> {
        let mut signed = Vec::with_capacity(txs.len());
        for (i, tx) in txs.iter().enumerate() {
            match self.sign(tx).await {
                Ok(s) => signed.push(s),
                Err(error) => {
                    return Err(BatchFailure {
                        signed,
                        failed_at: i,
                        error,
                    })
                }
            }
        }
        Ok(signed)
    }

    /// Release the session. No-op when already disconnected.
    async fn disconnect(&mut self);
}
