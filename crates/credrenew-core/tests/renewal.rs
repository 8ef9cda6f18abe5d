//! Renewal runs against an in-memory database and a scripted login.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use credrenew_browser::{Authenticator, LoginOutcome, LoginStep};
use credrenew_core::notify::NotificationChannel;
use credrenew_core::{
    AccountId, AccountStatus, CredentialService, Dispatcher, NotifyError, ProcessingStatus,
    RenewalEngine, RenewalOutcome, RunReport, Scheduler, Storage,
};
use credrenew_vault::VaultKey;
use uuid::Uuid;

const SEED: &str = "JBSWY3DPEHPK3PXP";

type Attempt = (String, String, String);

#[derive(Clone)]
struct FakeLogin {
    succeed: bool,
    attempts: Arc<Mutex<Vec<Attempt>>>,
}

impl FakeLogin {
    fn new(succeed: bool) -> Self {
        Self {
            succeed,
            attempts: Arc::default(),
        }
    }

    fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authenticator for FakeLogin {
    async fn attempt_login(&self, identifier: &str, secret: &str, otp_seed: &str) -> LoginOutcome {
        self.attempts.lock().unwrap().push((
            identifier.to_string(),
            secret.to_string(),
            otp_seed.to_string(),
        ));
        if self.succeed {
            LoginOutcome {
                success: true,
                message: "Login successful".into(),
                trail: vec![LoginStep::Navigate, LoginStep::Verify],
                terminal: LoginStep::Success,
            }
        } else {
            LoginOutcome {
                success: false,
                message: "ENTER_SECRET failed: timed out".into(),
                trail: vec![LoginStep::Navigate, LoginStep::EnterSecret],
                terminal: LoginStep::Failure,
            }
        }
    }
}

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<Vec<RenewalOutcome>>>);

#[async_trait]
impl NotificationChannel for Inbox {
    fn channel_type(&self) -> &'static str {
        "inbox"
    }

    async fn send(&self, outcome: &RenewalOutcome) -> Result<(), NotifyError> {
        self.0.lock().unwrap().push(outcome.clone());
        Ok(())
    }
}

struct Broken;

#[async_trait]
impl NotificationChannel for Broken {
    fn channel_type(&self) -> &'static str {
        "broken"
    }

    async fn send(&self, _outcome: &RenewalOutcome) -> Result<(), NotifyError> {
        Err(NotifyError::Config("unreachable relay".into()))
    }
}

struct Harness {
    storage: Storage,
    service: CredentialService,
    login: FakeLogin,
    inbox: Inbox,
    engine: RenewalEngine<FakeLogin>,
}

impl Harness {
    async fn new(succeed: bool) -> Self {
        let storage = Storage::in_memory().await.unwrap();
        let service = CredentialService::new(storage.accounts.clone(), VaultKey::generate());
        let login = FakeLogin::new(succeed);
        let inbox = Inbox::default();
        let engine = RenewalEngine::new(
            Scheduler::new(storage.accounts.clone(), storage.ledger.clone()),
            storage.ledger.clone(),
            service.clone(),
            login.clone(),
            Dispatcher::new().with_channel(Broken).with_channel(inbox.clone()),
        );
        Self {
            storage,
            service,
            login,
            inbox,
            engine,
        }
    }

    /// Stores an account; the short pause keeps creation times distinct.
    async fn store(&self, identifier: &str) -> AccountId {
        let id = self.service.store(identifier, "pw", SEED).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        id
    }

    async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        self.engine.run_once_at(now).await.unwrap()
    }
}

/// Current time at the precision the ledger stores.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn processed_id(report: &RunReport) -> AccountId {
    report.outcome().unwrap().account_id
}

#[tokio::test]
async fn test_successful_run_records_and_notifies() {
    let h = Harness::new(true).await;
    let id = h.store("user@example.com").await;
    let now = now();

    let report = h.run_at(now).await;
    let outcome = report.outcome().unwrap();
    assert_eq!(outcome.account_id, id);
    assert_eq!(outcome.status, ProcessingStatus::Success);
    assert_eq!(outcome.message, "Login successful");

    // The authenticator saw exactly the stored triple.
    assert_eq!(
        h.login.attempts(),
        vec![("user@example.com".into(), "pw".into(), SEED.into())]
    );

    let state = h.storage.ledger.get_state(id).await.unwrap().unwrap();
    assert_eq!(state.last_status, ProcessingStatus::Success);
    assert_eq!(state.last_processed_at, Some(now));
    assert_eq!(h.storage.ledger.history(id, 10).await.unwrap().len(), 1);

    // The broken channel does not stop the working one.
    assert_eq!(*h.inbox.0.lock().unwrap(), vec![outcome.clone()]);

    // The claim is released after the run.
    assert!(h.storage.ledger.get_claim(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_failure_is_recorded() {
    let h = Harness::new(false).await;
    let id = h.store("user@example.com").await;

    let report = h.run_at(now()).await;
    let outcome = report.outcome().unwrap();
    assert_eq!(outcome.status, ProcessingStatus::Failure);
    assert_eq!(outcome.message, "ENTER_SECRET failed: timed out");

    let history = h.storage.ledger.history(id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ProcessingStatus::Failure);
    assert_eq!(history[0].message, outcome.message);
}

#[tokio::test]
async fn test_no_eligible_account_writes_nothing() {
    let h = Harness::new(true).await;
    assert_eq!(h.run_at(now()).await, RunReport::Idle);
    assert!(h.storage.ledger.list_states().await.unwrap().is_empty());
    assert!(h.inbox.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_eligibility_boundary() {
    let h = Harness::new(true).await;
    let id = h.store("user@example.com").await;
    let start = now();

    assert_eq!(processed_id(&h.run_at(start).await), id);
    assert_eq!(h.run_at(start + Duration::hours(24)).await, RunReport::Idle);
    assert_eq!(processed_id(&h.run_at(start + Duration::hours(25)).await), id);

    let history = h.storage.ledger.history(id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_inactive_accounts_are_never_selected() {
    let h = Harness::new(true).await;
    let disabled = h.store("disabled@example.com").await;
    let locked = h.store("locked@example.com").await;
    h.storage
        .accounts
        .set_status(disabled, AccountStatus::Disabled)
        .await
        .unwrap();
    h.storage
        .accounts
        .set_status(locked, AccountStatus::Locked)
        .await
        .unwrap();

    assert_eq!(h.run_at(now()).await, RunReport::Idle);
    assert!(h.login.attempts().is_empty());
}

#[tokio::test]
async fn test_never_processed_beats_overdue() {
    let h = Harness::new(true).await;
    let overdue = h.store("overdue@example.com").await;
    let fresh = h.store("fresh@example.com").await;
    let now = now();
    h.storage
        .ledger
        .record(
            overdue,
            ProcessingStatus::Success,
            "Login successful",
            now - Duration::hours(300),
        )
        .await
        .unwrap();

    assert_eq!(processed_id(&h.run_at(now).await), fresh);
    assert_eq!(processed_id(&h.run_at(now).await), overdue);
    assert_eq!(h.run_at(now).await, RunReport::Idle);
}

#[tokio::test]
async fn test_decryption_failure_is_isolated() {
    let h = Harness::new(true).await;

    // Sealed under a different key, so it cannot be opened by the engine.
    let foreign = CredentialService::new(h.storage.accounts.clone(), VaultKey::generate());
    let broken = foreign
        .store("broken@example.com", "pw", SEED)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let healthy = h.store("healthy@example.com").await;
    let now = now();

    let first = h.run_at(now).await;
    let outcome = first.outcome().unwrap();
    assert_eq!(outcome.account_id, broken);
    assert_eq!(outcome.status, ProcessingStatus::Failure);
    assert!(outcome.message.starts_with("Decryption failed"));
    assert!(h.login.attempts().is_empty());

    let second = h.run_at(now).await;
    assert_eq!(processed_id(&second), healthy);
    assert_eq!(second.outcome().unwrap().status, ProcessingStatus::Success);
}

#[tokio::test]
async fn test_claimed_account_is_skipped() {
    let h = Harness::new(true).await;
    let claimed = h.store("claimed@example.com").await;
    let free = h.store("free@example.com").await;
    let now = now();
    let other_run = Uuid::new_v4();

    assert!(
        h.storage
            .ledger
            .claim(claimed, other_run, now, Duration::minutes(30))
            .await
            .unwrap()
    );

    assert_eq!(processed_id(&h.run_at(now).await), free);
    assert_eq!(h.run_at(now).await, RunReport::Idle);

    // The other run's claim is untouched, and lapses after its TTL.
    let claim = h.storage.ledger.get_claim(claimed).await.unwrap().unwrap();
    assert_eq!(claim.owner, other_run);
    assert_eq!(
        processed_id(&h.run_at(now + Duration::minutes(30)).await),
        claimed
    );
}
