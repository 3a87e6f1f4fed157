//! Custos - Quorum Authorization Engine
//!
//! Authorizes value-moving operations by requiring a threshold of distinct,
//! registered members to approve a proposal before it can execute, and
//! abstracts signature production behind a pluggable signer backend.
//!
//! Key principles:
//! - One vault = one sealed registry = one proposal store
//! - Proposal state only moves forward; indices are never reused
//! - Signer backends never expose private key material
//! - Execution is exactly-once, serialized per proposal

pub mod authz;
pub mod ledger;
pub mod serialization;
pub mod signer;
pub mod tx;
