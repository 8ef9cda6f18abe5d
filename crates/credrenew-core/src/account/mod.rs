//! Account registry.
//!
//! Accounts hold their three secrets only as vault ciphertext plus the
//! per-account IV. Status changes are operator actions; the renewal run only
//! reads accounts.

mod credentials;
mod model;
mod repository;
mod validation;

pub use credentials::{Credentials, IDENTIFIER_SLOT, OTP_SEED_SLOT, SECRET_SLOT};
pub use model::{Account, AccountId, AccountStatus, SealedSecrets};
pub use repository::AccountRepository;
pub use validation::{ValidationError, ValidationResult, validate_credentials};
