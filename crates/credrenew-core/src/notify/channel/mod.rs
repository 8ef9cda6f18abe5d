//! Notification channels.
//!
//! - `log`: a structured `tracing` event
//! - `webhook`: JSON over HTTP
//! - `email`: plain-text mail over SMTP

mod email;
mod log;
mod webhook;

pub use email::{EmailChannel, EmailConfig, SmtpSecurity};
pub use log::LogChannel;
pub use webhook::{WebhookAuth, WebhookChannel, WebhookConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{NotifyError, RenewalOutcome};

/// A destination for renewal outcomes.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel type name, used in logs.
    fn channel_type(&self) -> &'static str;

    /// Delivers one outcome.
    async fn send(&self, outcome: &RenewalOutcome) -> Result<(), NotifyError>;
}

/// Channel configuration, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelConfig {
    /// Structured log event.
    Log,
    /// HTTP webhook.
    Webhook(WebhookConfig),
    /// SMTP email.
    Email(EmailConfig),
}

impl ChannelConfig {
    /// Get the channel type name.
    #[must_use]
    pub const fn channel_type(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Webhook(_) => "webhook",
            Self::Email(_) => "email",
        }
    }

    /// Check if the channel is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        match self {
            Self::Log => true,
            Self::Webhook(c) => c.enabled,
            Self::Email(c) => c.enabled,
        }
    }

    /// Constructs the channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable.
    pub fn build(&self) -> Result<Box<dyn NotificationChannel>, NotifyError> {
        Ok(match self {
            Self::Log => Box::new(LogChannel),
            Self::Webhook(c) => Box::new(WebhookChannel::new(c.clone())?),
            Self::Email(c) => Box::new(EmailChannel::new(c.clone())?),
        })
    }
}
