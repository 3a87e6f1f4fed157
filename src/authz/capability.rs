//! Member capabilities.
//!
//! The capability set is fixed and exhaustively enumerated. Callers test
//! membership explicitly; the bit encoding below is an internal detail of
//! the persisted layout and never appears in the public API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a member is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Create proposals.
    Propose,
    /// Cast votes (both approvals and rejections).
    Approve,
    /// Trigger execution of an approved proposal.
    Execute,
}

impl Capability {
    const ALL: [Capability; 3] = [Capability::Propose, Capability::Approve, Capability::Execute];

    fn bit(self) -> u8 {
        match self {
            Capability::Propose => 1 << 0,
            Capability::Approve => 1 << 1,
            Capability::Execute => 1 << 2,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Propose => write!(f, "propose"),
            Capability::Approve => write!(f, "approve"),
            Capability::Execute => write!(f, "execute"),
        }
    }
}

/// Set of capabilities held by one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// Empty set.
    pub fn none() -> Self {
        Self(0)
    }

    /// All three capabilities.
    pub fn all() -> Self {
        Self::none()
            .with(Capability::Propose)
            .with(Capability::Approve)
            .with(Capability::Execute)
    }

    /// Builder-style insertion.
    pub fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    /// Membership test.
    pub fn contains(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Iterate held capabilities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::none(), Self::with)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "{{{}}}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_contains_nothing() {
        let set = CapabilitySet::none();
        assert!(!set.contains(Capability::Propose));
        assert!(!set.contains(Capability::Approve));
        assert!(!set.contains(Capability::Execute));
    }

    #[test]
    fn test_with_is_additive() {
        let set = CapabilitySet::none()
            .with(Capability::Propose)
            .with(Capability::Execute);
        assert!(set.contains(Capability::Propose));
        assert!(!set.contains(Capability::Approve));
        assert!(set.contains(Capability::Execute));
    }

    #[test]
    fn test_all_holds_everything() {
        let set = CapabilitySet::all();
        for cap in [Capability::Propose, Capability::Approve, Capability::Execute] {
            assert!(set.contains(cap));
        }
    }

    #[test]
    fn test_with_is_idempotent() {
        let once = CapabilitySet::none().with(Capability::Approve);
        let twice = once.with(Capability::Approve);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_from_iterator() {
        let set: CapabilitySet = [Capability::Approve, Capability::Execute].into_iter().collect();
        assert!(!set.contains(Capability::Propose));
        assert!(set.contains(Capability::Approve));
        assert!(set.contains(Capability::Execute));
    }

    #[test]
    fn test_display() {
        let set = CapabilitySet::none().with(Capability::Propose).with(Capability::Approve);
        assert_eq!(set.to_string(), "{propose,approve}");
    }
}
