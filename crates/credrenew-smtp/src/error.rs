//! Error types for SMTP operations.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Server returned an error reply.
    #[error("SMTP error {code}: {message}")]
    Smtp {
        /// Reply code (e.g., 535).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// Unexpected or malformed reply.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server closed the connection mid-reply.
    #[error("Connection closed by server")]
    Closed,

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Feature not advertised by the server.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Creates an error from a reply code and message.
    #[must_use]
    pub fn smtp(code: u16, message: impl Into<String>) -> Self {
        Self::Smtp {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Smtp { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Smtp { code, .. } if *code >= 400 && *code < 500)
    }
}
