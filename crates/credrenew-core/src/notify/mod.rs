//! Notification of renewal outcomes.
//!
//! A [`Dispatcher`] hands each [`RenewalOutcome`] to its configured channels.
//! Delivery is best-effort: failures are logged and never affect the
//! recorded outcome.

mod channel;
mod dispatcher;

pub use channel::{
    ChannelConfig, EmailChannel, EmailConfig, LogChannel, NotificationChannel, SmtpSecurity,
    WebhookAuth, WebhookChannel, WebhookConfig,
};
pub use dispatcher::Dispatcher;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::AccountId;
use crate::ledger::ProcessingStatus;

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("Endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// SMTP submission failed.
    #[error("SMTP error: {0}")]
    Smtp(#[from] credrenew_smtp::Error),

    /// Delivery did not finish in time.
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// Channel configuration is unusable.
    #[error("Invalid channel configuration: {0}")]
    Config(String),
}

/// The result of one renewal run, as announced to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenewalOutcome {
    /// Processed account.
    pub account_id: AccountId,
    /// Outcome class.
    pub status: ProcessingStatus,
    /// Outcome message.
    pub message: String,
    /// When the attempt completed.
    pub timestamp: DateTime<Utc>,
}

impl RenewalOutcome {
    /// Creates an outcome.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        status: ProcessingStatus,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            status,
            message: message.into(),
            timestamp,
        }
    }

    /// Returns true if the login succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ProcessingStatus::Success
    }

    /// Timestamp rendered as RFC 3339 with millisecond precision.
    #[must_use]
    pub fn timestamp_str(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Subject line, e.g. `[credrenew] 2026-01-02T03:04:05.000Z: success`.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("[credrenew] {}: {}", self.timestamp_str(), self.status)
    }

    /// Plain-text body listing account, status and message.
    #[must_use]
    pub fn body(&self) -> String {
        format!(
            "Account: {}\nStatus: {}\nMessage: {}\nTime: {}\n",
            self.account_id,
            self.status,
            self.message,
            self.timestamp_str()
        )
    }
}
