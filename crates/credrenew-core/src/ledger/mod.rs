//! Processing ledger.
//!
//! Holds the latest processing state per account, an append-only audit log of
//! every renewal attempt, and the short-lived claims that keep two concurrent
//! runs off the same account.

mod model;
mod repository;

pub use model::{ProcessingLogEntry, ProcessingState, ProcessingStatus, RenewalClaim};
pub use repository::{DEFAULT_RETENTION_DAYS, LedgerRepository};
