//! Authorization engine.
//!
//! Orchestrates the proposal lifecycle for one vault: create, vote, cancel,
//! execute. Every operation validates the caller against the sealed member
//! registry, then does its read-modify-write under the proposal's own lock,
//! so the engine is safe to share (`Arc`) across concurrent callers.
//!
//! A signer backend is borrowed `&mut` only for the duration of one
//! execution and its session is released on every exit path.

use super::capability::Capability;
use super::proposal::{Decision, Proposal, ProposalState};
use super::registry::{MemberId, MemberRegistry};
use super::store::{ProposalStore, StoreError, StoreSnapshot};
use crate::ledger::retry::retry_with_backoff;
use crate::ledger::traits::{Confirmation, LedgerError, LedgerGateway};
use crate::signer::traits::{SignerBackend, SignerError};
use crate::tx::{Transaction, VaultId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{info, warn};

/// Engine policy knobs. Everything here is an explicit, documented policy
/// choice; the defaults are the minimal semantics.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Move a proposal to Rejected once the approve count can no longer
    /// reach threshold. Off by default: a minority reject never cancels.
    pub early_reject: bool,

    /// Members allowed to cancel proposals they did not create. Empty by
    /// default: creator-only cancellation.
    pub cancel_overrides: Vec<MemberId>,
}

/// Engine operation errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller is not registered or lacks the required capability.
    #[error("{member} lacks the {required} capability")]
    Unauthorized {
        member: MemberId,
        required: Capability,
    },

    /// Caller may not cancel this proposal (not creator, not an override).
    #[error("{member} may not cancel proposal {index}")]
    CancelDenied { member: MemberId, index: u64 },

    /// No proposal at this index.
    #[error("unknown proposal {0}")]
    UnknownProposal(u64),

    /// Operation requires an Active proposal.
    #[error("proposal {index} is {state}, not active")]
    ProposalNotActive { index: u64, state: ProposalState },

    /// Execution requires an Approved proposal.
    #[error("proposal {index} is {state}, not approved")]
    ProposalNotReady { index: u64, state: ProposalState },

    /// Execution attempted before the time-lock elapsed.
    #[error("proposal {index} time-locked until {executable_at}")]
    TimeLocked { index: u64, executable_at: u64 },

    /// Ledger failed before any signature was produced (freshness token).
    #[error("ledger unavailable: {0}")]
    Ledger(#[source] LedgerError),

    /// Signer backend failed; no submission happened.
    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),

    /// Submission failed after a signature was produced. The proposal
    /// stays Approved; `transient` says whether resubmission is safe,
    /// `signature_produced` that a valid signature may exist out there.
    #[error("submission failed: {source}")]
    Submission {
        transient: bool,
        signature_produced: bool,
        #[source]
        source: LedgerError,
    },
}

/// Full persisted layout for one vault: the sealed registry plus every
/// proposal, both keyed by the vault id inside the store snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub registry: MemberRegistry,
    pub store: StoreSnapshot,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

/// The multi-party authorization engine for one vault.
///
/// Exclusively owns the vault's [`ProposalStore`] and [`MemberRegistry`].
/// Generic over the ledger gateway the way the rest of the crate is
/// generic over external services: the engine depends only on the trait.
pub struct AuthorizationEngine<L: LedgerGateway> {
    registry: Arc<MemberRegistry>,
    store: ProposalStore,
    ledger: L,
    config: EngineConfig,
}

impl<L: LedgerGateway> AuthorizationEngine<L> {
    pub fn new(vault: VaultId, registry: MemberRegistry, ledger: L, config: EngineConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            store: ProposalStore::new(vault),
            ledger,
            config,
        }
    }

    /// Rebuild an engine around a restored store (snapshot recovery).
    pub fn with_store(
        store: ProposalStore,
        registry: MemberRegistry,
        ledger: L,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            store,
            ledger,
            config,
        }
    }

    pub fn vault(&self) -> VaultId {
        self.store.vault()
    }

    pub fn registry(&self) -> &MemberRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ProposalStore {
        &self.store
    }

    /// Copy out one proposal for inspection.
    pub async fn proposal(&self, index: u64) -> Option<Proposal> {
        let entry = self.store.get(index)?;
        let guard = entry.lock().await;
        Some(guard.clone())
    }

    /// Snapshot the store for persistence.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot().await
    }

    /// Snapshot the full vault: registry and store together.
    pub async fn vault_snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            registry: (*self.registry).clone(),
            store: self.store.snapshot().await,
        }
    }

    /// Rebuild an engine from a full vault snapshot.
    pub fn from_vault_snapshot(
        snapshot: VaultSnapshot,
        ledger: L,
        config: EngineConfig,
    ) -> Result<Self, StoreError> {
        let store = ProposalStore::restore(snapshot.store)?;
        Ok(Self::with_store(store, snapshot.registry, ledger, config))
    }

    /// Create a proposal in state Active with an empty vote set.
    pub async fn create_proposal(
        &self,
        creator: &MemberId,
        payload: Vec<u8>,
        time_lock: Duration,
    ) -> Result<Proposal, EngineError> {
        self.require(creator, Capability::Propose)?;

        let created_at = unix_now();
        let creator = creator.clone();
        let (index, entry) = self.store.insert_with(|index| {
            Proposal::new(index, creator, payload, time_lock.as_secs(), created_at)
        });

        let proposal = entry.lock().await.clone();
        info!(vault = %self.vault(), index, creator = %proposal.creator, "proposal created");
        Ok(proposal)
    }

    /// Cast or change a vote. Returns the proposal state after the tally.
    pub async fn cast_vote(
        &self,
        index: u64,
        member: &MemberId,
        decision: Decision,
    ) -> Result<ProposalState, EngineError> {
        // The same capability governs approving and rejecting: a reject is
        // a withheld approval, not a separate permission.
        self.require(member, Capability::Approve)?;

        let entry = self
            .store
            .get(index)
            .ok_or(EngineError::UnknownProposal(index))?;
        let mut proposal = entry.lock().await;

        proposal
            .record_vote(member.clone(), decision)
            .map_err(|state| EngineError::ProposalNotActive { index, state })?;

        let state = proposal.retally(&self.registry, self.config.early_reject);
        info!(
            vault = %self.vault(),
            index,
            member = %member,
            ?decision,
            approvals = proposal.approvals(),
            threshold = self.registry.threshold(),
            %state,
            "vote recorded"
        );
        Ok(state)
    }

    /// Abort a proposal that has not executed.
    ///
    /// Allowed for the creator, or for members listed in
    /// [`EngineConfig::cancel_overrides`]. Cancelling an already-cancelled
    /// or executed proposal fails.
    pub async fn cancel_proposal(&self, index: u64, member: &MemberId) -> Result<(), EngineError> {
        let entry = self
            .store
            .get(index)
            .ok_or(EngineError::UnknownProposal(index))?;
        let mut proposal = entry.lock().await;

        let is_creator = &proposal.creator == member;
        let is_override = self.config.cancel_overrides.contains(member);
        if !is_creator && !is_override {
            return Err(EngineError::CancelDenied {
                member: member.clone(),
                index,
            });
        }

        proposal
            .cancel()
            .map_err(|state| EngineError::ProposalNotActive { index, state })?;
        info!(vault = %self.vault(), index, member = %member, "proposal cancelled");
        Ok(())
    }

    /// Execute an approved proposal: assemble, sign, submit, confirm.
    ///
    /// Holds the proposal's lock for the whole attempt, which serializes
    /// concurrent executors: the winner transitions to Executed, the loser
    /// observes that state and fails without touching the signer. On any
    /// failure the proposal keeps its Approved state and execution may be
    /// retried; post-signature failures report `signature_produced` so a
    /// caller reconciles against the ledger instead of assuming the
    /// attempt left no trace.
    pub async fn execute_proposal<S: SignerBackend>(
        &self,
        index: u64,
        executor: &MemberId,
        signer: &mut S,
    ) -> Result<Confirmation, EngineError> {
        self.require(executor, Capability::Execute)?;

        let entry = self
            .store
            .get(index)
            .ok_or(EngineError::UnknownProposal(index))?;
        let mut proposal = entry.lock().await;

        if proposal.state != ProposalState::Approved {
            return Err(EngineError::ProposalNotReady {
                index,
                state: proposal.state,
            });
        }
        let executable_at = proposal.executable_at();
        if unix_now() < executable_at {
            return Err(EngineError::TimeLocked {
                index,
                executable_at,
            });
        }

        // Assemble with a fresh anti-replay token. Nothing signed yet.
        let freshness = self
            .ledger
            .freshness_token()
            .await
            .map_err(EngineError::Ledger)?;
        let tx = Transaction {
            vault: self.vault(),
            payload: proposal.payload.clone(),
            freshness,
        };

        // Sign, releasing the backend session on every path.
        let identity = signer.connect().await?;
        let signed = match signer.sign(&tx).await {
            Ok(signed) => {
                signer.disconnect().await;
                signed
            }
            Err(err) => {
                signer.disconnect().await;
                return Err(EngineError::Signing(err));
            }
        };
        info!(vault = %self.vault(), index, signer = %identity, "transaction signed");

        // Submit; transient failures are retried within this attempt since
        // resubmitting the same signed transaction is safe.
        let submitted = retry_with_backoff(|| self.ledger.submit(&signed), LedgerError::is_transient).await;
        let confirmation = match submitted {
            Ok(confirmation) => confirmation,
            Err(err) => {
                warn!(vault = %self.vault(), index, %err, "submission failed after signing");
                return Err(EngineError::Submission {
                    transient: err.is_transient(),
                    signature_produced: true,
                    source: err,
                });
            }
        };

        proposal
            .mark_executed(confirmation.clone())
            .map_err(|state| EngineError::ProposalNotReady { index, state })?;
        info!(
            vault = %self.vault(),
            index,
            executor = %executor,
            receipt = %confirmation.receipt,
            "proposal executed"
        );
        Ok(confirmation)
    }

    fn require(&self, member: &MemberId, required: Capability) -> Result<(), EngineError> {
        if self.registry.has_capability(member, required) {
            Ok(())
        } else {
            Err(EngineError::Unauthorized {
                member: member.clone(),
                required,
            })
        }
    }
}
