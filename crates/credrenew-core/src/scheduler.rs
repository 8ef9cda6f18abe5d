//! Eligibility scheduler.
//!
//! Picks at most one account per run: active accounts only, never-processed
//! before previously processed, oldest first within each group.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::account::{Account, AccountId, AccountRepository, AccountStatus};
use crate::ledger::{LedgerRepository, ProcessingState};
use crate::Result;

/// Default minimum interval between two attempts on one account.
pub const DEFAULT_MIN_INTERVAL_HOURS: u32 = 25;

/// Returns true if an account with this state may be processed at `now`.
#[must_use]
pub fn is_eligible(
    state: Option<&ProcessingState>,
    now: DateTime<Utc>,
    min_interval: Duration,
) -> bool {
    match state.and_then(|s| s.last_processed_at) {
        None => true,
        Some(last) => now - last >= min_interval,
    }
}

/// Ranks the eligible active accounts, highest priority first.
#[must_use]
pub fn rank_candidates(
    accounts: Vec<Account>,
    states: &HashMap<AccountId, ProcessingState>,
    now: DateTime<Utc>,
    min_interval: Duration,
) -> Vec<Account> {
    let mut ranked: Vec<(bool, DateTime<Utc>, Account)> = accounts
        .into_iter()
        .filter(|account| account.status == AccountStatus::Active)
        .filter_map(|account| {
            let state = states.get(&account.id);
            if !is_eligible(state, now, min_interval) {
                return None;
            }
            let last = state.and_then(|s| s.last_processed_at);
            Some((last.is_some(), last.unwrap_or(account.created_at), account))
        })
        .collect();

    ranked.sort_by(|a, b| (a.0, a.1, a.2.id).cmp(&(b.0, b.1, b.2.id)));
    ranked.into_iter().map(|(_, _, account)| account).collect()
}

/// Selects accounts due for renewal.
#[derive(Debug, Clone)]
pub struct Scheduler {
    accounts: AccountRepository,
    ledger: LedgerRepository,
    min_interval: Duration,
}

impl Scheduler {
    /// Creates a scheduler with the default 25 hour interval.
    #[must_use]
    pub fn new(accounts: AccountRepository, ledger: LedgerRepository) -> Self {
        Self {
            accounts,
            ledger,
            min_interval: Duration::hours(i64::from(DEFAULT_MIN_INTERVAL_HOURS)),
        }
    }

    /// Sets the minimum interval between two attempts on one account.
    #[must_use]
    pub const fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Returns the minimum interval.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Returns the highest-ranked eligible account now.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry or ledger cannot be read.
    pub async fn select_next(&self) -> Result<Option<Account>> {
        self.select_next_at(Utc::now()).await
    }

    /// Returns the highest-ranked eligible account at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry or ledger cannot be read.
    pub async fn select_next_at(&self, now: DateTime<Utc>) -> Result<Option<Account>> {
        Ok(self.candidates(now).await?.into_iter().next())
    }

    /// Claims the highest-ranked eligible account not claimed by another run.
    ///
    /// Eligibility is checked again once the claim is held, so an account that
    /// another run processed after ranking is released and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry or ledger cannot be read or written.
    pub async fn claim_next(
        &self,
        now: DateTime<Utc>,
        owner: Uuid,
        ttl: Duration,
    ) -> Result<Option<Account>> {
        let ranked = self.candidates(now).await?;
        self.claim_first(ranked, now, owner, ttl).await
    }

    async fn claim_first(
        &self,
        ranked: Vec<Account>,
        now: DateTime<Utc>,
        owner: Uuid,
        ttl: Duration,
    ) -> Result<Option<Account>> {
        for account in ranked {
            if !self.ledger.claim(account.id, owner, now, ttl).await? {
                debug!("Account {} is claimed by another run, skipping", account.id);
                continue;
            }

            let state = self.ledger.get_state(account.id).await?;
            if is_eligible(state.as_ref(), now, self.min_interval) {
                return Ok(Some(account));
            }

            debug!("Account {} was processed by another run, skipping", account.id);
            self.ledger.release(account.id, owner).await?;
        }
        Ok(None)
    }

    async fn candidates(&self, now: DateTime<Utc>) -> Result<Vec<Account>> {
        let accounts = self.accounts.list_by_status(AccountStatus::Active).await?;
        let states = self
            .ledger
            .list_states()
            .await?
            .into_iter()
            .map(|state| (state.account_id, state))
            .collect::<HashMap<_, _>>();

        let ranked = rank_candidates(accounts, &states, now, self.min_interval);
        debug!("{} eligible account(s)", ranked.len());
        Ok(ranked)
    }
}
