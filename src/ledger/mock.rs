//! Mock ledger for tests and the demo CLI.
//!
//! In-memory broadcast-and-confirm: issues counter-based freshness tokens,
//! records every accepted submission, rejects token replay the way a real
//! ledger rejects a stale or reused anti-replay datum, and lets tests
//! script transient/permanent failures.

use super::traits::{Confirmation, FreshnessToken, LedgerError, LedgerGateway, LedgerResult};
use crate::tx::SignedTransaction;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Default)]
struct MockState {
    next_token: u64,
    used_tokens: HashSet<u64>,
    accepted: Vec<SignedTransaction>,
    submit_failures: VecDeque<LedgerError>,
}

/// Scriptable in-memory ledger gateway.
#[derive(Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<MockState>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error for an upcoming `submit` call (FIFO).
    pub fn fail_next_submit(&self, error: LedgerError) {
        self.state.lock().unwrap().submit_failures.push_back(error);
    }

    /// Transactions the ledger has accepted, in order.
    pub fn accepted(&self) -> Vec<SignedTransaction> {
        self.state.lock().unwrap().accepted.clone()
    }

    pub fn accepted_count(&self) -> usize {
        self.state.lock().unwrap().accepted.len()
    }
}

fn receipt_for(tx: &SignedTransaction) -> String {
    let mut hasher = Sha256::new();
    hasher.update(&tx.signature);
    hex::encode(hasher.finalize())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

#[async_trait]
impl LedgerGateway for MockLedger {
    async fn freshness_token(&self) -> LedgerResult<FreshnessToken> {
        let mut state = self.state.lock().unwrap();
        let token = FreshnessToken(state.next_token);
        state.next_token += 1;
        Ok(token)
    }

    async fn submit(&self, tx: &SignedTransaction) -> LedgerResult<Confirmation> {
        let mut state = self.state.lock().unwrap();

        if let Some(error) = state.submit_failures.pop_front() {
            return Err(error);
        }

        if !state.used_tokens.insert(tx.transaction.freshness.0) {
            return Err(LedgerError::Permanent(format!(
                "freshness token {} already consumed",
                tx.transaction.freshness.0
            )));
        }

        state.accepted.push(tx.clone());
        Ok(Confirmation::new(receipt_for(tx), unix_now()))
    }
}
