//! Proposal store.
//!
//! Owns every proposal ever created for one vault, keyed by a monotonic,
//! gap-free index. Each entry sits behind its own `tokio::sync::Mutex` so
//! votes and executions against the same proposal serialize while
//! operations on different proposals proceed without contention; the only
//! cross-proposal synchronization is the atomic index counter and the
//! brief map access.

use super::proposal::Proposal;
use crate::serialization::{from_cbor, to_cbor, SerializationError};
use crate::tx::VaultId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;

/// Store errors (persistence and snapshot validation).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

/// Durable, ordered collection of proposals for one vault.
pub struct ProposalStore {
    vault: VaultId,
    next_index: AtomicU64,
    proposals: RwLock<BTreeMap<u64, Arc<Mutex<Proposal>>>>,
}

impl ProposalStore {
    pub fn new(vault: VaultId) -> Self {
        Self {
            vault,
            next_index: AtomicU64::new(0),
            proposals: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn vault(&self) -> VaultId {
        self.vault
    }

    /// Allocate the next index and store the proposal built from it.
    ///
    /// `fetch_add` keeps allocation unique and gap-free under concurrent
    /// creators; indices are never reused, including after cancellation.
    pub fn insert_with(&self, build: impl FnOnce(u64) -> Proposal) -> (u64, Arc<Mutex<Proposal>>) {
        let index = self.next_index.fetch_add(1, Ordering::SeqCst);
        let entry = Arc::new(Mutex::new(build(index)));
        self.proposals
            .write()
            .expect("proposal map lock poisoned")
            .insert(index, entry.clone());
        (index, entry)
    }

    /// Fetch the shared handle for one proposal.
    pub fn get(&self, index: u64) -> Option<Arc<Mutex<Proposal>>> {
        self.proposals
            .read()
            .expect("proposal map lock poisoned")
            .get(&index)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.proposals.read().expect("proposal map lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices in creation order.
    pub fn indices(&self) -> Vec<u64> {
        self.proposals
            .read()
            .expect("proposal map lock poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Copy out the full state for persistence.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let entries: Vec<Arc<Mutex<Proposal>>> = {
            let map = self.proposals.read().expect("proposal map lock poisoned");
            map.values().cloned().collect()
        };

        let mut proposals = Vec::with_capacity(entries.len());
        for entry in entries {
            proposals.push(entry.lock().await.clone());
        }

        StoreSnapshot {
            vault: self.vault,
            next_index: self.next_index.load(Ordering::SeqCst),
            proposals,
        }
    }

    /// Rebuild a store from a snapshot, validating index invariants.
    pub fn restore(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut map = BTreeMap::new();
        for proposal in snapshot.proposals {
            if proposal.index >= snapshot.next_index {
                return Err(StoreError::CorruptSnapshot(format!(
                    "proposal index {} at or beyond next index {}",
                    proposal.index, snapshot.next_index
                )));
            }
            let index = proposal.index;
            if map.insert(index, Arc::new(Mutex::new(proposal))).is_some() {
                return Err(StoreError::CorruptSnapshot(format!(
                    "duplicate proposal index {}",
                    index
                )));
            }
        }

        Ok(Self {
            vault: snapshot.vault,
            next_index: AtomicU64::new(snapshot.next_index),
            proposals: RwLock::new(map),
        })
    }

    /// Persist a CBOR snapshot to disk.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = self.snapshot().await;
        let bytes = to_cbor(&snapshot)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a CBOR snapshot from disk.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path)?;
        let snapshot: StoreSnapshot = from_cbor(&bytes)?;
        Self::restore(snapshot)
    }
}

/// Persisted layout: entries are keyed by (vault, index).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub vault: VaultId,
    pub next_index: u64,
    pub proposals: Vec<Proposal>,
}
