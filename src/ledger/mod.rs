//! Ledger gateway.
//!
//! Interface to the external ledger that finalizes signed transactions,
//! plus the in-memory mock and the submission retry helper.

pub mod mock;
pub mod retry;
pub mod traits;

pub use mock::MockLedger;
pub use traits::{Confirmation, FreshnessToken, LedgerError, LedgerGateway, LedgerResult};
