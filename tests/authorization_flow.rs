//! Integration test for the end-to-end authorization flow.
//!
//! Walks the complete lifecycle:
//! 1. Seal a 2-of-3 registry from dev signer identities
//! 2. Create a proposal
//! 3. Collect approvals up to threshold
//! 4. Execute through a development signer
//! 5. Verify the ledger-accepted signature under the reported identity
//! 6. Check terminal-state behavior, cancellation, and signer-failure
//!    recovery
//! 7. Snapshot the store and resume against a fresh engine

use custos::authz::{
    AuthorizationEngine, Decision, EngineConfig, EngineError, Member, MemberId, MemberRegistry,
    ProposalState, VaultSnapshot,
};
use custos::ledger::{LedgerError, MockLedger};
use custos::signer::{DevSigner, MockSigner, SignerError};
use custos::tx::{PublicIdentity, VaultId};
use ring::signature::{UnparsedPublicKey, ED25519};
use std::time::Duration;

fn dev_signer(tag: u8) -> DevSigner {
    DevSigner::from_seed([tag; 32])
}

fn member_ids() -> Vec<MemberId> {
    (1u8..=3)
        .map(|tag| MemberId(dev_signer(tag).identity().unwrap().0))
        .collect()
}

fn two_of_three() -> MemberRegistry {
    let members = member_ids().into_iter().map(Member::full).collect();
    MemberRegistry::new(members, 2).unwrap()
}

fn engine() -> (AuthorizationEngine<MockLedger>, MockLedger, Vec<MemberId>) {
    let ledger = MockLedger::new();
    let engine = AuthorizationEngine::new(
        VaultId::from_bytes(&[0xcdu8; 32]),
        two_of_three(),
        ledger.clone(),
        EngineConfig::default(),
    );
    (engine, ledger, member_ids())
}

#[tokio::test]
async fn test_full_lifecycle_with_dev_signer() {
    let (engine, ledger, ids) = engine();
    let (alice, bob, carol) = (&ids[0], &ids[1], &ids[2]);

    // 1. Create P0 at index 0.
    let p0 = engine
        .create_proposal(alice, b"transfer 100 to treasury".to_vec(), Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(p0.index, 0);
    assert_eq!(p0.state, ProposalState::Active);

    // 2. First approval leaves the proposal Active.
    let state = engine.cast_vote(0, alice, Decision::Approve).await.unwrap();
    assert_eq!(state, ProposalState::Active);

    // 3. Second approval reaches the 2-of-3 threshold.
    let state = engine.cast_vote(0, bob, Decision::Approve).await.unwrap();
    assert_eq!(state, ProposalState::Approved);

    // 4. Execute with carol's dev signer.
    let mut signer = dev_signer(3);
    let confirmation = engine
        .execute_proposal(0, carol, &mut signer)
        .await
        .unwrap();
    assert!(!confirmation.receipt.is_empty());

    let executed = engine.proposal(0).await.unwrap();
    assert_eq!(executed.state, ProposalState::Executed);
    assert_eq!(executed.receipt.as_ref(), Some(&confirmation));

    // 5. The accepted transaction's signature verifies under carol's key.
    let accepted = ledger.accepted();
    assert_eq!(accepted.len(), 1);
    let signed = &accepted[0];
    assert_eq!(signed.signer, PublicIdentity(carol.0.clone()));
    let public_key = hex::decode(&signed.signer.0).unwrap();
    UnparsedPublicKey::new(&ED25519, &public_key)
        .verify(
            &signed.transaction.signing_bytes().unwrap(),
            &signed.signature,
        )
        .expect("ledger-accepted signature must verify");

    // 6. Votes after execution fail with a state error.
    for member in [alice, carol] {
        let err = engine
            .cast_vote(0, member, Decision::Approve)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::ProposalNotActive {
                state: ProposalState::Executed,
                ..
            }
        ));
    }
}

#[tokio::test]
async fn test_cancel_before_any_approval() {
    let (engine, _, ids) = engine();
    let (alice, bob) = (&ids[0], &ids[1]);

    let p1 = engine
        .create_proposal(alice, b"rotate custody key".to_vec(), Duration::ZERO)
        .await
        .unwrap();
    engine.cancel_proposal(p1.index, alice).await.unwrap();
    assert_eq!(
        engine.proposal(p1.index).await.unwrap().state,
        ProposalState::Cancelled
    );

    // Any subsequent vote or execute fails on state.
    let err = engine
        .cast_vote(p1.index, bob, Decision::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ProposalNotActive { .. }));

    let mut signer = dev_signer(2);
    let err = engine
        .execute_proposal(p1.index, bob, &mut signer)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ProposalNotReady { .. }));
}

#[tokio::test]
async fn test_signer_outage_then_retry() {
    let (engine, ledger, ids) = engine();
    let (alice, bob, carol) = (&ids[0], &ids[1], &ids[2]);

    let p = engine
        .create_proposal(alice, b"payout".to_vec(), Duration::ZERO)
        .await
        .unwrap();
    engine.cast_vote(p.index, alice, Decision::Approve).await.unwrap();
    engine.cast_vote(p.index, bob, Decision::Approve).await.unwrap();

    // Backend unavailable: execution fails as a signing error, the
    // proposal keeps its approvals.
    let mut broken = MockSigner::new(PublicIdentity(carol.0.clone()));
    broken.fail_next_connect(SignerError::ConnectFailed("hsm unreachable".to_string()));
    let err = engine
        .execute_proposal(p.index, carol, &mut broken)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Signing(_)));
    assert_eq!(
        engine.proposal(p.index).await.unwrap().state,
        ProposalState::Approved
    );
    assert_eq!(ledger.accepted_count(), 0);

    // Retried execution with a working signer succeeds without re-voting.
    let mut working = dev_signer(3);
    engine
        .execute_proposal(p.index, carol, &mut working)
        .await
        .unwrap();
    assert_eq!(
        engine.proposal(p.index).await.unwrap().state,
        ProposalState::Executed
    );
}

#[tokio::test]
async fn test_permanent_submission_failure_keeps_proposal_approved() {
    let (engine, ledger, ids) = engine();
    let (alice, bob, carol) = (&ids[0], &ids[1], &ids[2]);

    let p = engine
        .create_proposal(alice, b"payout".to_vec(), Duration::ZERO)
        .await
        .unwrap();
    engine.cast_vote(p.index, alice, Decision::Approve).await.unwrap();
    engine.cast_vote(p.index, bob, Decision::Approve).await.unwrap();

    ledger.fail_next_submit(LedgerError::Permanent("destination frozen".to_string()));
    let mut signer = dev_signer(3);
    let err = engine
        .execute_proposal(p.index, carol, &mut signer)
        .await
        .unwrap_err();

    // The error must say a signature was produced so the operator can
    // reconcile instead of blindly signing again.
    match err {
        EngineError::Submission {
            transient,
            signature_produced,
            ..
        } => {
            assert!(!transient);
            assert!(signature_produced);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        engine.proposal(p.index).await.unwrap().state,
        ProposalState::Approved
    );
}

#[tokio::test]
async fn test_snapshot_resume_preserves_lifecycle() {
    let (engine, _, ids) = engine();
    let (alice, bob, carol) = (&ids[0], &ids[1], &ids[2]);

    // Approve one proposal, cancel another, then snapshot.
    let p0 = engine
        .create_proposal(alice, b"payout".to_vec(), Duration::ZERO)
        .await
        .unwrap();
    engine.cast_vote(p0.index, alice, Decision::Approve).await.unwrap();
    engine.cast_vote(p0.index, bob, Decision::Approve).await.unwrap();

    let p1 = engine
        .create_proposal(bob, b"rotate".to_vec(), Duration::ZERO)
        .await
        .unwrap();
    engine.cancel_proposal(p1.index, bob).await.unwrap();

    // The full persisted layout (registry + store, keyed by vault) must
    // survive a serialization round-trip before resuming.
    let snapshot = engine.vault_snapshot().await;
    let bytes = custos::serialization::to_cbor(&snapshot).unwrap();
    let snapshot: VaultSnapshot = custos::serialization::from_cbor(&bytes).unwrap();
    assert_eq!(snapshot.store.vault, engine.vault());

    let ledger = MockLedger::new();
    let resumed =
        AuthorizationEngine::from_vault_snapshot(snapshot, ledger.clone(), EngineConfig::default())
            .unwrap();

    assert_eq!(
        resumed.proposal(p0.index).await.unwrap().state,
        ProposalState::Approved
    );
    assert_eq!(
        resumed.proposal(p1.index).await.unwrap().state,
        ProposalState::Cancelled
    );

    // The approved proposal executes on the resumed engine; indices
    // continue without reuse.
    let mut signer = dev_signer(3);
    resumed
        .execute_proposal(p0.index, carol, &mut signer)
        .await
        .unwrap();
    let p2 = resumed
        .create_proposal(alice, b"next".to_vec(), Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(p2.index, 2);
}

#[tokio::test]
async fn test_time_lock_gates_execution_end_to_end() {
    let (engine, _, ids) = engine();
    let (alice, bob, carol) = (&ids[0], &ids[1], &ids[2]);

    let p = engine
        .create_proposal(alice, b"payout".to_vec(), Duration::from_secs(86400))
        .await
        .unwrap();
    engine.cast_vote(p.index, alice, Decision::Approve).await.unwrap();
    engine.cast_vote(p.index, bob, Decision::Approve).await.unwrap();

    let mut signer = dev_signer(3);
    let err = engine
        .execute_proposal(p.index, carol, &mut signer)
        .await
        .unwrap_err();
    match err {
        EngineError::TimeLocked { executable_at, .. } => {
            assert_eq!(executable_at, p.created_at + 86400);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        engine.proposal(p.index).await.unwrap().state,
        ProposalState::Approved
    );
}
