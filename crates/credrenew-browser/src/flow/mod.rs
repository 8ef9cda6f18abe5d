//! The login state machine.
//!
//! [`LoginFlow`] walks a [`Page`] through the states in [`LoginStep`]. Every
//! required control is awaited with [`wait_for`]; interstitials are probed
//! with [`probe`] and skipped when absent. Errors never escape
//! [`LoginFlow::attempt_login`]: they end the attempt in FAILURE with a
//! message naming the state that failed.

mod step;
mod surface;
mod wait;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::page::{Element, Launcher, Page};
use crate::totp;

pub use step::LoginStep;
pub use surface::LoginSurface;
pub use wait::{probe, wait_for};

/// Result of one login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    /// True only when VERIFY accepted the final page.
    pub success: bool,
    /// Human-readable summary; names the failing state on failure.
    pub message: String,
    /// States entered, in order, excluding the terminal one.
    pub trail: Vec<LoginStep>,
    /// SUCCESS or FAILURE.
    pub terminal: LoginStep,
}

impl LoginOutcome {
    /// Returns the last non-terminal state reached.
    #[must_use]
    pub fn last_step(&self) -> Option<LoginStep> {
        self.trail.last().copied()
    }

    /// Returns true if `step` was entered during the attempt.
    #[must_use]
    pub fn visited(&self, step: LoginStep) -> bool {
        self.trail.contains(&step)
    }
}

/// Something that can attempt a login with plaintext credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Attempts one login. Never fails; problems are reported in the outcome.
    async fn attempt_login(&self, identifier: &str, secret: &str, otp_seed: &str) -> LoginOutcome;
}

/// States visited so far.
#[derive(Debug, Default)]
struct Trail(Vec<LoginStep>);

impl Trail {
    fn enter(&mut self, step: LoginStep) {
        debug!("Login step {step}");
        self.0.push(step);
    }

    fn current(&self) -> LoginStep {
        self.0.last().copied().unwrap_or(LoginStep::Navigate)
    }

    fn finish(self, success: bool, message: String) -> LoginOutcome {
        LoginOutcome {
            success,
            message,
            trail: self.0,
            terminal: if success {
                LoginStep::Success
            } else {
                LoginStep::Failure
            },
        }
    }

    fn fail(self, error: &Error) -> LoginOutcome {
        let message = format!("{} failed: {error}", self.current());
        self.finish(false, message)
    }
}

/// Decides VERIFY from the final URL and any visible error text.
fn verdict(surface: &LoginSurface, final_url: &str, error_text: Option<&str>) -> (bool, String) {
    match error_text {
        Some(text) => {
            let text = text.trim();
            if text.is_empty() {
                (false, "Login failed: error indicator present".into())
            } else {
                (false, format!("Login failed: {text}"))
            }
        }
        None if surface.is_landing_url(final_url) => (true, "Login successful".into()),
        None => (false, format!("Login failed: unexpected destination {final_url}")),
    }
}

/// Drives one login surface through a [`Launcher`].
#[derive(Debug, Clone)]
pub struct LoginFlow<L> {
    launcher: L,
    surface: LoginSurface,
}

impl<L: Launcher> LoginFlow<L> {
    /// Creates a flow for the given launcher and surface.
    #[must_use]
    pub const fn new(launcher: L, surface: LoginSurface) -> Self {
        Self { launcher, surface }
    }

    /// Returns the surface description.
    #[must_use]
    pub const fn surface(&self) -> &LoginSurface {
        &self.surface
    }

    /// Runs one login attempt.
    ///
    /// The browser session opened at NAVIGATE is closed before returning,
    /// whatever the outcome.
    pub async fn attempt_login(
        &self,
        identifier: &str,
        secret: &str,
        otp_seed: &str,
    ) -> LoginOutcome {
        let mut trail = Trail::default();
        trail.enter(LoginStep::Navigate);

        let mut page = match self.launcher.launch().await {
            Ok(page) => page,
            Err(e) => return trail.fail(&e),
        };

        let result = self
            .drive(&mut page, &mut trail, identifier, secret, otp_seed)
            .await;

        if let Err(e) = page.close().await {
            warn!("Failed to release browser session: {e}");
        }

        let outcome = match result {
            Ok((success, message)) => trail.finish(success, message),
            Err(e) => trail.fail(&e),
        };
        info!("Login attempt ended in {}: {}", outcome.terminal, outcome.message);
        outcome
    }

    async fn drive<P: Page>(
        &self,
        page: &mut P,
        trail: &mut Trail,
        identifier: &str,
        secret: &str,
        otp_seed: &str,
    ) -> Result<(bool, String)> {
        let s = &self.surface;

        timeout(s.navigation_timeout(), page.goto(&s.login_url))
            .await
            .map_err(|_| Error::Timeout {
                what: "the login page to load".into(),
                after: s.navigation_timeout(),
            })??;

        trail.enter(LoginStep::EnterIdentifier);
        let field = self.require(page, &s.identifier_selector).await?;
        type_text(page, &field, identifier, s.keystroke_delay()).await?;
        page.submit(&field).await?;
        settle(s.settle_after_identifier_ms).await;

        trail.enter(LoginStep::EnterSecret);
        let field = self.require(page, &s.secret_selector).await?;
        type_text(page, &field, secret, s.keystroke_delay()).await?;
        page.submit(&field).await?;
        settle(s.settle_after_secret_ms).await;

        trail.enter(LoginStep::EnterOneTimeCode);
        let field = self.require(page, &s.otp_selector).await?;
        let code = totp::generate_now(otp_seed)?;
        type_text(page, &field, &code, s.keystroke_delay() / 2).await?;
        page.submit(&field).await?;
        settle(s.settle_after_code_ms).await;

        if s.is_terms_url(&page.current_url().await?)
            && let Some(button) = self.optional(page, &s.terms_accept_selector).await?
        {
            trail.enter(LoginStep::TermsScreen);
            page.click(&button).await?;
            settle(s.settle_after_terms_ms).await;
        }

        if let Some(button) = self
            .optional(page, &s.stay_signed_in_decline_selector)
            .await?
        {
            trail.enter(LoginStep::StaySignedInScreen);
            page.click(&button).await?;
        }
        settle(s.settle_before_verify_ms).await;

        trail.enter(LoginStep::Verify);
        let final_url = page.current_url().await?;
        let error_text = match page.find(&s.error_selector).await? {
            Some(indicator) => Some(page.text(&indicator).await.unwrap_or_default()),
            None => None,
        };

        Ok(verdict(s, &final_url, error_text.as_deref()))
    }

    async fn require<P: Page>(&self, page: &mut P, selector: &str) -> Result<Element> {
        let s = &self.surface;
        wait_for(page, selector, s.step_timeout(), s.poll_interval()).await
    }

    async fn optional<P: Page>(&self, page: &mut P, selector: &str) -> Result<Option<Element>> {
        let s = &self.surface;
        probe(page, selector, s.probe_timeout(), s.poll_interval()).await
    }
}

/// Types `text` one character at a time, like a person would.
async fn type_text<P: Page>(
    page: &mut P,
    field: &Element,
    text: &str,
    delay: Duration,
) -> Result<()> {
    if delay.is_zero() {
        return page.send_keys(field, text).await;
    }

    let mut buf = [0u8; 4];
    for c in text.chars() {
        page.send_keys(field, c.encode_utf8(&mut buf)).await?;
        sleep(delay).await;
    }
    Ok(())
}

async fn settle(ms: u64) {
    if ms > 0 {
        sleep(Duration::from_millis(ms)).await;
    }
}

#[async_trait]
impl<L: Launcher> Authenticator for LoginFlow<L> {
    async fn attempt_login(&self, identifier: &str, secret: &str, otp_seed: &str) -> LoginOutcome {
        Self::attempt_login(self, identifier, secret, otp_seed).await
    }
}
