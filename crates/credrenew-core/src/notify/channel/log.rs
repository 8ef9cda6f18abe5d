//! Log channel.

use async_trait::async_trait;
use tracing::{info, warn};

use super::NotificationChannel;
use crate::notify::{NotifyError, RenewalOutcome};

/// Emits each outcome as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    fn channel_type(&self) -> &'static str {
        "log"
    }

    async fn send(&self, outcome: &RenewalOutcome) -> Result<(), NotifyError> {
        if outcome.is_success() {
            info!(
                account = %outcome.account_id,
                status = %outcome.status,
                "{}",
                outcome.message
            );
        } else {
            warn!(
                account = %outcome.account_id,
                status = %outcome.status,
                "{}",
                outcome.message
            );
        }
        Ok(())
    }
}
