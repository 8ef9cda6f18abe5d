//! Email channel over SMTP.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credrenew_smtp::connection::{connect, connect_tls};
use credrenew_smtp::{Address, Client, Envelope, Greeted, Message};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::NotificationChannel;
use crate::notify::{NotifyError, RenewalOutcome};

/// Transport security for SMTP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmtpSecurity {
    /// Implicit TLS, usually port 465.
    Tls,
    /// Plain connection upgraded with STARTTLS, usually port 587.
    #[default]
    StartTls,
    /// No encryption.
    None,
}

/// Email channel configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Whether the channel is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Transport security.
    #[serde(default)]
    pub security: SmtpSecurity,
    /// User name for AUTH PLAIN; no authentication when empty.
    #[serde(default)]
    pub username: String,
    /// Password for AUTH PLAIN.
    #[serde(default)]
    pub password: String,
    /// Sender address.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Name announced in EHLO.
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Limit for the whole SMTP dialogue in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

const fn default_enabled() -> bool {
    true
}

const fn default_port() -> u16 {
    587
}

const fn default_timeout() -> u64 {
    30
}

fn default_client_name() -> String {
    "localhost".to_string()
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("client_name", &self.client_name)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Mails outcomes to a fixed list of recipients.
#[derive(Debug)]
pub struct EmailChannel {
    config: EmailConfig,
    envelope: Envelope,
}

impl EmailChannel {
    /// Creates the channel.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] if the host is empty, there are no
    /// recipients, or an address is malformed.
    pub fn new(config: EmailConfig) -> Result<Self, NotifyError> {
        if config.host.trim().is_empty() {
            return Err(NotifyError::Config("email host is empty".into()));
        }
        if config.to.is_empty() {
            return Err(NotifyError::Config("email channel has no recipients".into()));
        }
        if config.timeout_secs == 0 {
            return Err(NotifyError::Config("email timeout must be positive".into()));
        }

        let from = parse_address(&config.from)?;
        let to = config
            .to
            .iter()
            .map(|addr| parse_address(addr))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            envelope: Envelope::new(from, to),
            config,
        })
    }

    /// Renders the message for an outcome.
    #[must_use]
    pub fn render(&self, outcome: &RenewalOutcome, date: DateTime<Utc>) -> Vec<u8> {
        Message::new(&self.envelope, outcome.subject(), outcome.body())
            .with_date(date)
            .to_bytes()
    }

    /// Runs the whole SMTP dialogue over an already connected stream.
    async fn deliver_over<T>(&self, stream: T, payload: &[u8]) -> Result<(), NotifyError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let client = Client::from_stream(stream)
            .await?
            .ehlo(&self.config.client_name)
            .await?;
        self.finish(client, payload).await
    }

    /// Authenticates if configured, sends and quits.
    async fn finish<T>(
        &self,
        client: Client<T, Greeted>,
        payload: &[u8],
    ) -> Result<(), NotifyError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let mut client = if self.config.username.is_empty() {
            client.without_auth()
        } else {
            client
                .auth_plain(&self.config.username, &self.config.password)
                .await?
        };
        client.send(&self.envelope, payload).await?;
        client.quit().await?;
        Ok(())
    }
}

fn parse_address(raw: &str) -> Result<Address, NotifyError> {
    Address::new(raw).map_err(|e| NotifyError::Config(e.to_string()))
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn channel_type(&self) -> &'static str {
        "email"
    }

    async fn send(&self, outcome: &RenewalOutcome) -> Result<(), NotifyError> {
        let payload = self.render(outcome, Utc::now());
        let limit = Duration::from_secs(self.config.timeout_secs);

        tokio::time::timeout(limit, self.submit(&payload))
            .await
            .map_err(|_| NotifyError::Timeout(self.config.timeout_secs))??;

        debug!(
            "Email notification sent to {} recipient(s)",
            self.envelope.to.len()
        );
        Ok(())
    }
}

impl EmailChannel {
    /// Connects according to the security mode and submits the payload.
    async fn submit(&self, payload: &[u8]) -> Result<(), NotifyError> {
        let host = &self.config.host;
        let port = self.config.port;

        match self.config.security {
            SmtpSecurity::Tls => {
                let stream = connect_tls(host, port).await?;
                self.deliver_over(stream, payload).await
            }
            SmtpSecurity::StartTls => {
                let stream = connect(host, port).await?;
                let client = Client::from_stream(stream)
                    .await?
                    .ehlo(&self.config.client_name)
                    .await?
                    .starttls(host)
                    .await?;
                self.finish(client, payload).await
            }
            SmtpSecurity::None => {
                let stream = connect(host, port).await?;
                self.deliver_over(stream, payload).await
            }
        }
    }
}
