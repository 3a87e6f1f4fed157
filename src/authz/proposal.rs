//! Proposals and their state machine.
//!
//! A proposal is a pending request to execute one action payload, subject
//! to quorum approval. State moves forward only:
//!
//! ```text
//! Active ─┬─► Approved ─┬─► Executed
//!         │             └─► Cancelled
//!         ├─► Rejected ───► Cancelled
//!         └─► Cancelled
//! ```
//!
//! Executed and Cancelled are terminal. The mutation methods here check the
//! current state and return it on refusal; permission checks live in the
//! engine, which is the only caller.

use super::registry::{MemberId, MemberRegistry};
use crate::ledger::traits::Confirmation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    /// Open for voting.
    Active,
    /// Quorum reached, awaiting execution.
    Approved,
    /// Threshold can no longer be reached (early-reject policy only).
    Rejected,
    /// Confirmed on the ledger. Terminal.
    Executed,
    /// Explicitly aborted. Terminal.
    Cancelled,
}

impl ProposalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Executed | ProposalState::Cancelled)
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalState::Active => "active",
            ProposalState::Approved => "approved",
            ProposalState::Rejected => "rejected",
            ProposalState::Executed => "executed",
            ProposalState::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// A member's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}

/// A pending request to execute an action, subject to quorum approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Monotonic index assigned by the store. Never reused.
    pub index: u64,
    pub creator: MemberId,
    /// Opaque serialized action intent.
    pub payload: Vec<u8>,
    pub state: ProposalState,
    /// One slot per member; a later vote overwrites the earlier one.
    pub votes: BTreeMap<MemberId, Decision>,
    /// Unix seconds at creation.
    pub created_at: u64,
    /// Minimum delay before execution is permitted, in seconds.
    pub time_lock_secs: u64,
    /// Ledger confirmation, set exactly once on execution.
    #[serde(default)]
    pub receipt: Option<Confirmation>,
}

impl Proposal {
    pub fn new(
        index: u64,
        creator: MemberId,
        payload: Vec<u8>,
        time_lock_secs: u64,
        created_at: u64,
    ) -> Self {
        Self {
            index,
            creator,
            payload,
            state: ProposalState::Active,
            votes: BTreeMap::new(),
            created_at,
            time_lock_secs,
            receipt: None,
        }
    }

    pub fn approvals(&self) -> u64 {
        self.votes.values().filter(|d| **d == Decision::Approve).count() as u64
    }

    pub fn rejections(&self) -> u64 {
        self.votes.values().filter(|d| **d == Decision::Reject).count() as u64
    }

    /// Unix seconds from which execution is permitted.
    pub fn executable_at(&self) -> u64 {
        self.created_at.saturating_add(self.time_lock_secs)
    }

    /// Upsert a vote. Refused (returning the actual state) unless Active.
    pub fn record_vote(
        &mut self,
        member: MemberId,
        decision: Decision,
    ) -> Result<(), ProposalState> {
        if self.state != ProposalState::Active {
            return Err(self.state);
        }
        self.votes.insert(member, decision);
        Ok(())
    }

    /// Recompute state from the current tally. Only meaningful while Active.
    ///
    /// Approvals at or above threshold move the proposal to Approved. With
    /// `early_reject`, the proposal moves to Rejected once the approve count
    /// cannot reach threshold counting eligible voters that have not voted;
    /// members that voted Reject are not counted as potential approvals.
    pub fn retally(&mut self, registry: &MemberRegistry, early_reject: bool) -> ProposalState {
        if self.state != ProposalState::Active {
            return self.state;
        }

        if self.approvals() >= registry.threshold() {
            self.state = ProposalState::Approved;
        } else if early_reject {
            let unvoted = registry
                .eligible_voters()
                .filter(|m| !self.votes.contains_key(&m.id))
                .count() as u64;
            if self.approvals() + unvoted < registry.threshold() {
                self.state = ProposalState::Rejected;
            }
        }
        self.state
    }

    /// Abort. Allowed from Active, Approved, or Rejected.
    pub fn cancel(&mut self) -> Result<(), ProposalState> {
        match self.state {
            ProposalState::Active | ProposalState::Approved | ProposalState::Rejected => {
                self.state = ProposalState::Cancelled;
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Consume the Approved precondition and record the receipt.
    ///
    /// The caller holds this proposal's lock, so the check and the
    /// transition are atomic: a second executor observes Executed.
    pub fn mark_executed(&mut self, receipt: Confirmation) -> Result<(), ProposalState> {
        if self.state != ProposalState::Approved {
            return Err(self.state);
        }
        self.state = ProposalState::Executed;
        self.receipt = Some(receipt);
        Ok(())
    }
}
