//! Ledger gateway abstraction.
//!
//! The ledger that finalizes transactions is an external collaborator, so
//! it is consumed only at this interface: hand out a fresh anti-replay
//! token, accept a signed transaction, report confirmation or failure.
//! Failures are split transient/permanent: resubmitting the same signed
//! transaction after a transient failure is safe, a permanent failure
//! needs an operator.

use crate::tx::SignedTransaction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recent anti-replay token the ledger requires in every transaction.
///
/// Stands in for whatever freshness datum the concrete ledger uses (a
/// recent block reference, a sequence number). Tokens are single-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FreshnessToken(pub u64);

/// Confirmation receipt for a finalized transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    /// Opaque ledger receipt (transaction id, signature, ...).
    pub receipt: String,
    /// Unix seconds at confirmation.
    pub confirmed_at: u64,
}

impl Confirmation {
    pub fn new(receipt: String, confirmed_at: u64) -> Self {
        Self {
            receipt,
            confirmed_at,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger gateway errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Timeout, congestion: safe to retry the same submission.
    #[error("transient ledger failure: {0}")]
    Transient(String),

    /// Invalid transaction, replayed token: operator intervention needed.
    #[error("permanent ledger failure: {0}")]
    Permanent(String),
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transient(_))
    }
}

/// Submit-and-confirm interface to the ledger.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Obtain a fresh anti-replay token for transaction assembly.
    async fn freshness_token(&self) -> LedgerResult<FreshnessToken>;

    /// Broadcast a signed transaction and await confirmation.
    async fn submit(&self, tx: &SignedTransaction) -> LedgerResult<Confirmation>;
}
