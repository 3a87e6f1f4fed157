//! Multi-party authorization.
//!
//! The state machine at the heart of the crate: a sealed member registry,
//! a monotonic proposal store, and the engine that drives proposals from
//! creation through quorum to execution.

pub mod capability;
pub mod engine;
pub mod proposal;
pub mod registry;
pub mod store;

#[cfg(test)]
mod proptests;

pub use capability::{Capability, CapabilitySet};
pub use engine::{AuthorizationEngine, EngineConfig, EngineError, VaultSnapshot};
pub use proposal::{Decision, Proposal, ProposalState};
pub use registry::{Member, MemberId, MemberRegistry, RegistryError};
pub use store::{ProposalStore, StoreError, StoreSnapshot};
