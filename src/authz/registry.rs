//! Member registry.
//!
//! The fixed set of parties authorized to act on one vault, plus the
//! approval threshold. Sealed at construction: validation happens once in
//! [`MemberRegistry::new`] and the registry is immutable afterwards, so the
//! engine never has to re-check threshold bounds or identity uniqueness.

use super::capability::{Capability, CapabilitySet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Opaque public identifier of a member.
///
/// Signer-derived members use the hex-encoded public key; nothing in the
/// engine depends on the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub String);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One authorized party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub capabilities: CapabilitySet,
}

impl Member {
    /// Member holding all capabilities.
    pub fn full(id: MemberId) -> Self {
        Self {
            id,
            capabilities: CapabilitySet::all(),
        }
    }
}

/// Registry construction errors. Fatal; a registry is never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Threshold outside 1..=member_count.
    #[error("invalid threshold {threshold} for {member_count} members")]
    InvalidThreshold { threshold: u64, member_count: usize },

    /// Two entries share an identity.
    #[error("duplicate member: {0}")]
    DuplicateMember(MemberId),
}

/// The sealed member set and threshold for one vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRegistry {
    members: Vec<Member>,
    threshold: u64,
}

impl MemberRegistry {
    /// Validate and seal a registry.
    ///
    /// The threshold counts Approve votes only; it is checked against the
    /// full member count, not against the count of members holding the
    /// Approve capability.
    pub fn new(members: Vec<Member>, threshold: u64) -> Result<Self, RegistryError> {
        if threshold < 1 || threshold as usize > members.len() {
            return Err(RegistryError::InvalidThreshold {
                threshold,
                member_count: members.len(),
            });
        }

        let mut seen = HashSet::new();
        for member in &members {
            if !seen.insert(&member.id) {
                return Err(RegistryError::DuplicateMember(member.id.clone()));
            }
        }

        Ok(Self { members, threshold })
    }

    /// Approvals required before execution is permitted.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Look up a member; unknown ids return None.
    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    /// Whether `id` is registered and holds `cap`.
    ///
    /// Unknown identities return false rather than erroring so callers
    /// reject uniformly.
    pub fn has_capability(&self, id: &MemberId, cap: Capability) -> bool {
        self.member(id)
            .map(|m| m.capabilities.contains(cap))
            .unwrap_or(false)
    }

    /// Members holding the Approve capability (the eligible voter pool).
    pub fn eligible_voters(&self) -> impl Iterator<Item = &Member> {
        self.members
            .iter()
            .filter(|m| m.capabilities.contains(Capability::Approve))
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// "2-of-3" style description.
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.members.len())
    }
}
