//! Signer backends.
//!
//! The pluggable seam between the authorization engine and whatever
//! produces signatures. The engine depends only on
//! [`traits::SignerBackend`]; the variants here are the development
//! in-memory signer, the production-shaped remote signer, and a
//! scriptable mock.

pub mod dev;
pub mod mock;
pub mod remote;
pub mod traits;

pub use dev::{DevSigner, SeedError};
pub use mock::MockSigner;
pub use remote::{RemoteSigner, SignerTransport, TransportError};
pub use traits::{BatchFailure, SignerBackend, SignerError, SignerResult};
