//! The renewal run.
//!
//! One run processes at most one account:
//! claim, decrypt, log in, record, release, notify.

use chrono::{DateTime, Duration, Utc};
use credrenew_browser::{Authenticator, LoginFlow, WebDriver};
use tracing::{info, warn};
use uuid::Uuid;

use super::{CredentialService, Storage, login_flow};
use crate::Result;
use crate::account::Account;
use crate::config::{Config, DEFAULT_CLAIM_TTL_MINUTES};
use crate::ledger::{LedgerRepository, ProcessingStatus};
use crate::notify::{Dispatcher, RenewalOutcome};
use crate::scheduler::Scheduler;

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// No account was eligible; nothing was written.
    Idle,
    /// One account was processed.
    Processed(RenewalOutcome),
}

impl RunReport {
    /// Returns the outcome, if an account was processed.
    #[must_use]
    pub const fn outcome(&self) -> Option<&RenewalOutcome> {
        match self {
            Self::Idle => None,
            Self::Processed(outcome) => Some(outcome),
        }
    }
}

/// Runs scheduled renewals.
pub struct RenewalEngine<A> {
    scheduler: Scheduler,
    ledger: LedgerRepository,
    credentials: CredentialService,
    authenticator: A,
    dispatcher: Dispatcher,
    claim_ttl: Duration,
}

impl<A> std::fmt::Debug for RenewalEngine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewalEngine")
            .field("scheduler", &self.scheduler)
            .field("dispatcher", &self.dispatcher)
            .field("claim_ttl", &self.claim_ttl)
            .finish_non_exhaustive()
    }
}

impl RenewalEngine<LoginFlow<WebDriver>> {
    /// Builds the production engine from configuration.
    ///
    /// Fails before any account is touched if the configuration, the vault
    /// key or a notification channel is unusable.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`], [`crate::Error::Vault`] or a database
    /// error.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let (key, source) = config.resolve_vault_key()?;
        info!("Vault key loaded from {source:?}");

        let dispatcher = Dispatcher::from_configs(&config.notifications)
            .map_err(|e| crate::Error::Config(format!("notifications: {e}")))?;
        let flow = login_flow(config)?;
        let storage = Storage::open(config).await?;

        let scheduler = Scheduler::new(storage.accounts.clone(), storage.ledger.clone())
            .with_min_interval(config.min_interval());
        Ok(Self::new(
            scheduler,
            storage.ledger,
            CredentialService::new(storage.accounts, key),
            flow,
            dispatcher,
        )
        .with_claim_ttl(config.claim_ttl()))
    }
}

impl<A: Authenticator> RenewalEngine<A> {
    /// Assembles an engine from its parts.
    #[must_use]
    pub fn new(
        scheduler: Scheduler,
        ledger: LedgerRepository,
        credentials: CredentialService,
        authenticator: A,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            scheduler,
            ledger,
            credentials,
            authenticator,
            dispatcher,
            claim_ttl: Duration::minutes(i64::from(DEFAULT_CLAIM_TTL_MINUTES)),
        }
    }

    /// Sets how long a claim survives a crashed run.
    #[must_use]
    pub const fn with_claim_ttl(mut self, claim_ttl: Duration) -> Self {
        self.claim_ttl = claim_ttl;
        self
    }

    /// Runs one renewal now.
    ///
    /// # Errors
    ///
    /// Returns an error only for storage failures. Decryption and login
    /// problems are recorded as a failure outcome.
    pub async fn run_once(&self) -> Result<RunReport> {
        self.run_once_at(Utc::now()).await
    }

    /// Runs one renewal, treating `now` as the current time.
    ///
    /// # Errors
    ///
    /// Returns an error only for storage failures.
    pub async fn run_once_at(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let owner = Uuid::new_v4();
        let Some(account) = self.scheduler.claim_next(now, owner, self.claim_ttl).await? else {
            info!("No eligible account");
            return Ok(RunReport::Idle);
        };
        info!("Processing account {}", account.id);

        let recorded = self.process(&account, now).await;

        match self.ledger.release(account.id, owner).await {
            Ok(true) => {}
            Ok(false) => warn!("Claim on account {} was lost before release", account.id),
            Err(e) => warn!("Failed to release claim on account {}: {e}", account.id),
        }

        let outcome = recorded?;
        info!(
            "Account {} processed: {} ({})",
            outcome.account_id, outcome.status, outcome.message
        );
        self.dispatcher.dispatch(&outcome).await;
        Ok(RunReport::Processed(outcome))
    }

    async fn process(&self, account: &Account, now: DateTime<Utc>) -> Result<RenewalOutcome> {
        let (status, message) = match self.credentials.decrypt(account) {
            Ok(credentials) => {
                let login = self
                    .authenticator
                    .attempt_login(
                        &credentials.identifier,
                        &credentials.secret,
                        &credentials.otp_seed,
                    )
                    .await;
                (ProcessingStatus::from_success(login.success), login.message)
            }
            Err(e) => {
                warn!("Cannot decrypt account {}: {e}", account.id);
                (ProcessingStatus::Failure, format!("Decryption failed: {e}"))
            }
        };

        self.ledger.record(account.id, status, &message, now).await?;
        Ok(RenewalOutcome::new(account.id, status, message, now))
    }
}
