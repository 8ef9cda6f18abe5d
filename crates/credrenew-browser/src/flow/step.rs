//! States of the login state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One state of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoginStep {
    /// Open the login page.
    Navigate,
    /// Type the login identifier.
    EnterIdentifier,
    /// Type the passphrase.
    EnterSecret,
    /// Type the time-based one-time code.
    EnterOneTimeCode,
    /// Accept the terms-of-use interstitial.
    TermsScreen,
    /// Decline the "stay signed in?" prompt.
    StaySignedInScreen,
    /// Inspect where the browser ended up.
    Verify,
    /// Terminal: authenticated.
    Success,
    /// Terminal: anything else.
    Failure,
}

impl LoginStep {
    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Navigate => "NAVIGATE",
            Self::EnterIdentifier => "ENTER_IDENTIFIER",
            Self::EnterSecret => "ENTER_SECRET",
            Self::EnterOneTimeCode => "ENTER_ONE_TIME_CODE",
            Self::TermsScreen => "TERMS_SCREEN",
            Self::StaySignedInScreen => "STAY_SIGNED_IN_SCREEN",
            Self::Verify => "VERIFY",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }

    /// Returns true for interstitial screens that may not appear.
    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::TermsScreen | Self::StaySignedInScreen)
    }

    /// Returns true for SUCCESS and FAILURE.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for step in [
            LoginStep::Navigate,
            LoginStep::EnterOneTimeCode,
            LoginStep::StaySignedInScreen,
            LoginStep::Failure,
        ] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{step}\""));
        }
    }

    #[test]
    fn test_classification() {
        assert!(LoginStep::TermsScreen.is_optional());
        assert!(!LoginStep::EnterSecret.is_optional());
        assert!(LoginStep::Success.is_terminal());
        assert!(!LoginStep::Verify.is_terminal());
    }
}
