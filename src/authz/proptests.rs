//! Property tests for registry and voting invariants.

use super::capability::CapabilitySet;
use super::proposal::{Decision, Proposal, ProposalState};
use super::registry::{Member, MemberId, MemberRegistry};
use proptest::prelude::*;

fn members(n: usize) -> Vec<Member> {
    (0..n)
        .map(|i| Member::full(MemberId(format!("member-{}", i))))
        .collect()
}

fn proposal() -> Proposal {
    Proposal::new(0, MemberId("member-0".to_string()), b"act".to_vec(), 0, 1_700_000_000)
}

proptest! {
    // Threshold bounds hold for every registry that constructs; every
    // violation is rejected at construction.
    #[test]
    fn prop_threshold_bounds(member_count in 1usize..12, threshold in 0u64..16) {
        let result = MemberRegistry::new(members(member_count), threshold);
        let in_bounds = threshold >= 1 && threshold as usize <= member_count;
        prop_assert_eq!(result.is_ok(), in_bounds);
        if let Ok(registry) = result {
            prop_assert!(registry.threshold() >= 1);
            prop_assert!(registry.threshold() as usize <= registry.member_count());
        }
    }

    // Any member list containing a repeated identity is rejected.
    #[test]
    fn prop_duplicate_identity_rejected(member_count in 2usize..8, dup in 0usize..8) {
        let mut list = members(member_count);
        let dup = dup % member_count;
        list.push(Member {
            id: MemberId(format!("member-{}", dup)),
            capabilities: CapabilitySet::all(),
        });
        prop_assert!(MemberRegistry::new(list, 1).is_err());
    }

    // The recorded voter set never exceeds the member count and each
    // identity's vote reflects only its most recent cast.
    #[test]
    fn prop_vote_upsert(
        member_count in 1usize..6,
        casts in prop::collection::vec((0usize..6, prop::bool::ANY), 0..40),
    ) {
        let mut p = proposal();
        let mut last: std::collections::HashMap<usize, Decision> = Default::default();

        for (voter, approve) in casts {
            let voter = voter % member_count;
            let decision = if approve { Decision::Approve } else { Decision::Reject };
            p.record_vote(MemberId(format!("member-{}", voter)), decision).unwrap();
            last.insert(voter, decision);
        }

        prop_assert!(p.votes.len() <= member_count);
        prop_assert_eq!(p.votes.len(), last.len());
        for (voter, decision) in last {
            let id = MemberId(format!("member-{}", voter));
            prop_assert_eq!(p.votes.get(&id), Some(&decision));
        }
    }

    // Approved exactly when the approve count reaches threshold.
    #[test]
    fn prop_approved_iff_threshold(
        member_count in 1usize..6,
        threshold in 1u64..6,
        approvers in prop::collection::hash_set(0usize..6, 0..6),
    ) {
        prop_assume!(threshold as usize <= member_count);
        let registry = MemberRegistry::new(members(member_count), threshold).unwrap();

        let mut p = proposal();
        let approvers: Vec<usize> =
            approvers.into_iter().filter(|a| *a < member_count).collect();
        for voter in &approvers {
            p.record_vote(MemberId(format!("member-{}", voter)), Decision::Approve).unwrap();
            p.retally(&registry, false);
            if p.state != ProposalState::Active {
                break;
            }
        }

        if approvers.len() as u64 >= threshold {
            prop_assert_eq!(p.state, ProposalState::Approved);
        } else {
            prop_assert_eq!(p.state, ProposalState::Active);
        }
    }
}
