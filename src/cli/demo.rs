//! End-to-end demo of the proposal lifecycle.
//!
//! Runs one full create → approve → execute round against an in-memory
//! ledger with development signers. Nothing here touches a real ledger or
//! real keys; the point is to watch the state machine work.

use super::config::CustosConfig;
use super::duration::parse_time_lock;
use custos::authz::{AuthorizationEngine, Decision, EngineError, Member, MemberId, MemberRegistry};
use custos::ledger::MockLedger;
use custos::signer::DevSigner;
use custos::tx::VaultId;
use rand::RngCore;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub async fn execute(
    config_path: Option<String>,
    threshold: u64,
    members: u64,
    action: String,
    time_lock: String,
    snapshot: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = CustosConfig::load_or_default(config_path.as_deref().map(Path::new))?;
    init_logging(&config);

    let time_lock = parse_time_lock(&time_lock)?;

    // Deterministic dev signers; member identities are their public keys.
    let mut signers: Vec<DevSigner> = (0..members)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[..8].copy_from_slice(&(i + 1).to_le_bytes());
            DevSigner::from_seed(seed)
        })
        .collect();

    let mut ids = Vec::with_capacity(signers.len());
    for signer in &signers {
        ids.push(MemberId(signer.identity()?.0));
    }

    let registry = MemberRegistry::new(ids.iter().cloned().map(Member::full).collect(), threshold)?;
    println!("Registry sealed: {} quorum", registry.description());

    let mut vault_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut vault_bytes);
    let vault = VaultId::from_bytes(&vault_bytes);
    println!("Demo vault: {}", vault);

    let ledger = MockLedger::new();
    let engine = AuthorizationEngine::new(vault, registry, ledger.clone(), config.vault.engine_config());

    let proposal = engine
        .create_proposal(&ids[0], action.into_bytes(), time_lock)
        .await?;
    println!(
        "Proposal {} created ({}, time-lock {}s)",
        proposal.index,
        proposal.state,
        proposal.time_lock_secs
    );

    for (i, id) in ids.iter().take(threshold as usize).enumerate() {
        let state = engine
            .cast_vote(proposal.index, id, Decision::Approve)
            .await?;
        println!("Member {} approved -> {}", i, state);
    }

    let executor = ids.last().expect("demo registry is never empty").clone();
    let signer = signers.last_mut().expect("demo registry is never empty");
    match engine
        .execute_proposal(proposal.index, &executor, signer)
        .await
    {
        Ok(confirmation) => {
            println!("Executed. Ledger receipt: {}", confirmation.receipt);
            println!("Ledger accepted {} transaction(s)", ledger.accepted_count());
        }
        Err(EngineError::TimeLocked { executable_at, .. }) => {
            println!(
                "Execution is time-locked until unix {}; the proposal stays approved",
                executable_at
            );
        }
        Err(other) => return Err(other.into()),
    }

    let snapshot_path = snapshot
        .map(PathBuf::from)
        .or_else(|| config.store.snapshot_path.clone());
    if let Some(path) = snapshot_path {
        engine.store().save_to(&path).await?;
        println!("Store snapshot written to {}", path.display());
    }

    Ok(())
}

fn init_logging(config: &CustosConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    // Ignore the error when a test harness already installed a subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
