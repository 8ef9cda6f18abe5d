//! Error types for vault operations.

use thiserror::Error;

/// Errors that can occur while sealing or opening secrets.
#[derive(Debug, Error)]
pub enum Error {
    /// Ciphertext failed authentication (wrong key or tampered data).
    #[error("Integrity check failed: wrong key or tampered ciphertext")]
    Integrity,

    /// Encryption failed inside the cipher.
    #[error("Encryption failed")]
    Encrypt,

    /// Key material has the wrong length or encoding.
    #[error("Invalid vault key: {0}")]
    InvalidKey(String),

    /// IV material has the wrong length or encoding.
    #[error("Invalid IV: {0}")]
    InvalidIv(String),

    /// Stored ciphertext is not valid base64.
    #[error("Invalid ciphertext encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Decrypted bytes are not valid UTF-8.
    #[error("Decrypted value is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// No vault key could be found in any configured source.
    #[error("Vault key not configured (set {0} or store one in the system keyring)")]
    KeyNotConfigured(&'static str),

    /// Failed to access the system keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
