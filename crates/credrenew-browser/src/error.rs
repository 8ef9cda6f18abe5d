//! Error types for login automation.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while driving the login surface.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport error talking to the WebDriver endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebDriver endpoint returned an error response.
    #[error("WebDriver error: {error} - {message}")]
    WebDriver {
        /// W3C error code (e.g. `session not created`).
        error: String,
        /// Human-readable description.
        message: String,
    },

    /// An element disappeared or could not be located.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A bounded wait expired.
    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout {
        /// What was being waited for.
        what: String,
        /// The configured limit.
        after: Duration,
    },

    /// The one-time-code seed is not valid base32.
    #[error("Invalid one-time-code seed: {0}")]
    InvalidOtpSeed(String),

    /// Unexpected response shape.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Creates an error from a W3C WebDriver error code and message.
    ///
    /// Lookup failures are mapped to [`Error::ElementNotFound`] so callers can
    /// treat them like any missing control.
    #[must_use]
    pub fn webdriver(error: impl Into<String>, message: impl Into<String>) -> Self {
        let error = error.into();
        let message = message.into();
        match error.as_str() {
            "no such element" | "stale element reference" => Self::ElementNotFound(message),
            _ => Self::WebDriver { error, message },
        }
    }

    /// Returns true if this error is an expired wait.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
