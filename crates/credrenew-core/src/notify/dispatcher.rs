//! Fan-out of outcomes to notification channels.

use tracing::{debug, warn};

use super::channel::{ChannelConfig, NotificationChannel};
use super::{NotifyError, RenewalOutcome};

/// Delivers outcomes to every configured channel.
///
/// A dispatcher without channels is valid and delivers nothing.
#[derive(Default)]
pub struct Dispatcher {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "channels",
                &self
                    .channels
                    .iter()
                    .map(|c| c.channel_type())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with no channels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel.
    #[must_use]
    pub fn with_channel(mut self, channel: impl NotificationChannel + 'static) -> Self {
        self.channels.push(Box::new(channel));
        self
    }

    /// Builds every enabled channel from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] or [`NotifyError::Http`] if a channel
    /// cannot be constructed.
    pub fn from_configs(configs: &[ChannelConfig]) -> Result<Self, NotifyError> {
        let mut channels = Vec::with_capacity(configs.len());
        for config in configs {
            if !config.is_enabled() {
                debug!("Skipping disabled {} channel", config.channel_type());
                continue;
            }
            channels.push(config.build()?);
        }
        Ok(Self { channels })
    }

    /// Number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if there are no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Sends an outcome to every channel.
    ///
    /// Failures are logged and swallowed. Returns how many channels accepted
    /// the notification.
    pub async fn dispatch(&self, outcome: &RenewalOutcome) -> usize {
        if self.channels.is_empty() {
            debug!("No notification channels configured");
            return 0;
        }

        let mut delivered = 0;
        for channel in &self.channels {
            match channel.send(outcome).await {
                Ok(()) => {
                    debug!("Notified via {}", channel.channel_type());
                    delivered += 1;
                }
                Err(e) => warn!(
                    "Failed to notify via {} for account {}: {e}",
                    channel.channel_type(),
                    outcome.account_id
                ),
            }
        }
        delivered
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::AccountId;
    use crate::ledger::ProcessingStatus;

    struct Failing;

    #[async_trait]
    impl NotificationChannel for Failing {
        fn channel_type(&self) -> &'static str {
            "failing"
        }

        async fn send(&self, _outcome: &RenewalOutcome) -> Result<(), NotifyError> {
            Err(NotifyError::Status {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    #[derive(Clone, Default)]
    struct Recording(Arc<Mutex<Vec<RenewalOutcome>>>);

    #[async_trait]
    impl NotificationChannel for Recording {
        fn channel_type(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, outcome: &RenewalOutcome) -> Result<(), NotifyError> {
            self.0.lock().unwrap().push(outcome.clone());
            Ok(())
        }
    }

    fn outcome() -> RenewalOutcome {
        RenewalOutcome::new(
            AccountId::generate(),
            ProcessingStatus::Success,
            "Login successful",
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_empty_dispatcher_is_noop() {
        let dispatcher = Dispatcher::new();
        assert!(dispatcher.is_empty());
        assert_eq!(dispatcher.dispatch(&outcome()).await, 0);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_other_channels() {
        let recording = Recording::default();
        let dispatcher = Dispatcher::new()
            .with_channel(Failing)
            .with_channel(recording.clone());
        let outcome = outcome();

        assert_eq!(dispatcher.len(), 2);
        assert_eq!(dispatcher.dispatch(&outcome).await, 1);
        assert_eq!(*recording.0.lock().unwrap(), vec![outcome]);
    }

    #[test]
    fn test_from_configs_skips_disabled() {
        let configs: Vec<ChannelConfig> = serde_json::from_str(
            r#"[
                {"type": "log"},
                {"type": "webhook", "enabled": false, "url": "http://localhost:1/hook"}
            ]"#,
        )
        .unwrap();
        let dispatcher = Dispatcher::from_configs(&configs).unwrap();
        assert_eq!(dispatcher.len(), 1);
    }
}
