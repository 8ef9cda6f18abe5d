//! Description of the login surface being driven.
//!
//! Defaults describe the consumer Microsoft account sign-in used for store
//! renewals. Every selector, URL and delay can be overridden from the config
//! file; omitted fields keep their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// URLs, selectors and timings for one login surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginSurface {
    /// Page opened at NAVIGATE.
    pub login_url: String,
    /// Identifier (email) input.
    pub identifier_selector: String,
    /// Passphrase input.
    pub secret_selector: String,
    /// One-time code input.
    pub otp_selector: String,
    /// URL prefix that marks the terms-of-use interstitial.
    pub terms_url_prefix: String,
    /// Accept button on the terms screen.
    pub terms_accept_selector: String,
    /// "No" button on the stay-signed-in prompt.
    pub stay_signed_in_decline_selector: String,
    /// Substring the final URL must contain for SUCCESS.
    pub landing_url_pattern: String,
    /// Any visible match fails VERIFY.
    pub error_selector: String,

    /// Limit for the initial page load.
    pub navigation_timeout_ms: u64,
    /// Limit for each required control.
    pub step_timeout_ms: u64,
    /// Limit for each optional screen.
    pub probe_timeout_ms: u64,
    /// Interval between element lookups while waiting.
    pub poll_interval_ms: u64,
    /// Pause between keystrokes; zero types the whole value at once.
    pub keystroke_delay_ms: u64,

    /// Settle after submitting the identifier.
    pub settle_after_identifier_ms: u64,
    /// Settle after submitting the passphrase.
    pub settle_after_secret_ms: u64,
    /// Settle after submitting the one-time code.
    pub settle_after_code_ms: u64,
    /// Settle after accepting the terms.
    pub settle_after_terms_ms: u64,
    /// Settle before inspecting the final page.
    pub settle_before_verify_ms: u64,
}

impl Default for LoginSurface {
    fn default() -> Self {
        Self {
            login_url: "https://www.microsoft.com/cascadeauth/store/account/signin".into(),
            identifier_selector: r#"input[type="email"]"#.into(),
            secret_selector: r#"input[type="password"]"#.into(),
            otp_selector: r#"input[name="otc"]"#.into(),
            terms_url_prefix: "https://account.live.com/tou/accrue".into(),
            terms_accept_selector: r#"[data-testid="primaryButton"]"#.into(),
            stay_signed_in_decline_selector: r#"[data-testid="secondaryButton"]"#.into(),
            landing_url_pattern: "https://www.microsoft.com/".into(),
            error_selector: r#"div.error, div[role="alert"]"#.into(),
            navigation_timeout_ms: 30_000,
            step_timeout_ms: 10_000,
            probe_timeout_ms: 2_000,
            poll_interval_ms: 250,
            keystroke_delay_ms: 100,
            settle_after_identifier_ms: 2_000,
            settle_after_secret_ms: 2_000,
            settle_after_code_ms: 3_000,
            settle_after_terms_ms: 3_000,
            settle_before_verify_ms: 5_000,
        }
    }
}

impl LoginSurface {
    /// Returns a copy with keystroke and settle delays set to zero.
    ///
    /// Useful against local fixtures where nothing needs to settle.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.keystroke_delay_ms = 0;
        self.settle_after_identifier_ms = 0;
        self.settle_after_secret_ms = 0;
        self.settle_after_code_ms = 0;
        self.settle_after_terms_ms = 0;
        self.settle_before_verify_ms = 0;
        self
    }

    pub(crate) const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub(crate) const fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub(crate) const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub(crate) const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub(crate) const fn keystroke_delay(&self) -> Duration {
        Duration::from_millis(self.keystroke_delay_ms)
    }

    /// Returns true when `url` is the terms-of-use interstitial.
    #[must_use]
    pub fn is_terms_url(&self, url: &str) -> bool {
        !self.terms_url_prefix.is_empty() && url.starts_with(&self.terms_url_prefix)
    }

    /// Returns true when `url` is the authenticated landing page.
    #[must_use]
    pub fn is_landing_url(&self, url: &str) -> bool {
        url.contains(&self.landing_url_pattern)
    }
}
