//! # credrenew-core
//!
//! Core of the credential renewal engine.
//!
//! This crate provides:
//! - Account registry (`SQLite`), secrets stored only as vault ciphertext
//! - Processing ledger: latest state per account plus an append-only audit log
//! - Eligibility scheduler with an atomic per-account claim
//! - Notification dispatch (log, webhook, email)
//! - The store/fetch boundary and the renewal run itself
//!
//! One renewal run processes at most one account:
//!
//! ```text
//! select + claim ─→ decrypt ─→ login ─→ record state + log ─→ release ─→ notify
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
pub mod db;
mod error;
pub mod ledger;
pub mod notify;
pub mod scheduler;
pub mod service;

pub use account::{
    Account, AccountId, AccountRepository, AccountStatus, Credentials, SealedSecrets,
    ValidationError, ValidationResult, validate_credentials,
};
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{
    LedgerRepository, ProcessingLogEntry, ProcessingState, ProcessingStatus, RenewalClaim,
};
pub use notify::{ChannelConfig, Dispatcher, NotificationChannel, NotifyError, RenewalOutcome};
pub use scheduler::Scheduler;
pub use service::{CredentialService, RenewalEngine, RunReport, Storage};
