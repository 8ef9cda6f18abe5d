//! Error types for the core library.

use thiserror::Error;

use crate::account::{AccountId, ValidationError};

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials rejected before storage.
    #[error("Invalid credentials: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// Encryption, decryption or key handling failed.
    #[error("Vault error: {0}")]
    Vault(#[from] credrenew_vault::Error),

    /// A stored value could not be interpreted.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A value supplied by the caller could not be parsed.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
