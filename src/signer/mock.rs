//! Mock signer backend for tests.
//!
//! Scriptable failures plus invocation counters, so tests can assert not
//! just outcomes but how often the backend was actually asked to sign.
//! The exactly-once execution tests depend on that.

use super::traits::{SignerBackend, SignerError, SignerResult};
use crate::tx::{PublicIdentity, SignedTransaction, Transaction};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    connected: bool,
    connect_failures: VecDeque<SignerError>,
    sign_failures: VecDeque<SignerError>,
    // (signs still to succeed, error to return then)
    deferred_sign_failure: Option<(u64, SignerError)>,
    connect_count: u64,
    sign_count: u64,
    disconnect_count: u64,
}

/// Scriptable in-memory signer backend.
///
/// Clones share state, so a test can hand one clone to the engine and keep
/// another for assertions.
#[derive(Clone)]
pub struct MockSigner {
    state: Arc<Mutex<MockState>>,
    identity: PublicIdentity,
}

impl MockSigner {
    pub fn new(identity: PublicIdentity) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            identity,
        }
    }

    /// Queue an error for the next `connect` call.
    pub fn fail_next_connect(&self, error: SignerError) {
        self.state.lock().unwrap().connect_failures.push_back(error);
    }

    /// Queue an error for the next `sign` call.
    pub fn fail_next_sign(&self, error: SignerError) {
        self.state.lock().unwrap().sign_failures.push_back(error);
    }

    /// Let `successes` more signs succeed, then fail the one after.
    pub fn fail_sign_after(&self, successes: u64, error: SignerError) {
        self.state.lock().unwrap().deferred_sign_failure = Some((successes, error));
    }

    pub fn connect_count(&self) -> u64 {
        self.state.lock().unwrap().connect_count
    }

    pub fn sign_count(&self) -> u64 {
        self.state.lock().unwrap().sign_count
    }

    pub fn disconnect_count(&self) -> u64 {
        self.state.lock().unwrap().disconnect_count
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}

#[async_trait]
impl SignerBackend for MockSigner {
    async fn connect(&mut self) -> SignerResult<PublicIdentity> {
        let mut state = self.state.lock().unwrap();
        if state.connected {
            return Err(SignerError::AlreadyConnected);
        }
        state.connect_count += 1;
        if let Some(error) = state.connect_failures.pop_front() {
            return Err(error);
        }
        state.connected = true;
        Ok(self.identity.clone())
    }

    async fn sign(&mut self, tx: &Transaction) -> SignerResult<SignedTransaction> {
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Err(SignerError::NotConnected);
        }
        state.sign_count += 1;
        if let Some(error) = state.sign_failures.pop_front() {
            return Err(error);
        }
        match state.deferred_sign_failure.take() {
            Some((0, error)) => return Err(error),
            Some((n, error)) => state.deferred_sign_failure = Some((n - 1, error)),
            None => {}
        }
        Ok(SignedTransaction {
            transaction: tx.clone(),
            signer: self.identity.clone(),
            signature: format!("mock-sig-{}", state.sign_count).into_bytes(),
        })
    }

    async fn disconnect(&mut self) {
        let mut state = self.state.lock().unwrap();
        if state.connected {
            state.connected = false;
            state.disconnect_count += 1;
        }
    }
}
