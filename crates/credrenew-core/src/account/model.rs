//! Account model types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use credrenew_vault::Iv;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Unique identifier for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Wraps an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh random (v4) identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| Error::InvalidValue(format!("account id {s:?}: {e}")))
    }
}

/// Operator-controlled account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Eligible for renewal.
    #[default]
    Active,
    /// Excluded from renewal by the operator.
    Disabled,
    /// Excluded from renewal after the remote side locked it.
    Locked,
}

impl AccountStatus {
    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            "locked" => Ok(Self::Locked),
            other => Err(Error::InvalidValue(format!(
                "account status {other:?} (expected active, disabled or locked)"
            ))),
        }
    }
}

/// The three secret fields, each as base64 AES-GCM ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecrets {
    /// Login identifier.
    pub identifier: String,
    /// Passphrase.
    pub secret: String,
    /// One-time-code seed.
    pub otp_seed: String,
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Encrypted secrets.
    pub secrets: SealedSecrets,
    /// Per-account IV the secrets were sealed under.
    pub iv: Iv,
    /// Operator-controlled status.
    pub status: AccountStatus,
    /// When the account was stored.
    pub created_at: DateTime<Utc>,
    /// Last change to the row.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns true if the scheduler may consider this account.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    mod account_id_tests {
        use super::*;

        #[test]
        fn display_and_parse() {
            let id = AccountId::generate();
            let parsed: AccountId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
        }

        #[test]
        fn generated_ids_are_v4() {
            let id = AccountId::generate();
            assert_eq!(id.0.get_version_num(), 4);
            assert_ne!(id, AccountId::generate());
        }

        #[test]
        fn parse_rejects_garbage() {
            assert!(matches!(
                "not-a-uuid".parse::<AccountId>(),
                Err(Error::InvalidValue(_))
            ));
        }

        #[test]
        fn serializes_as_plain_string() {
            let id = AccountId::new(Uuid::nil());
            assert_eq!(
                serde_json::to_string(&id).unwrap(),
                "\"00000000-0000-0000-0000-000000000000\""
            );
        }
    }

    mod status_tests {
        use super::*;

        #[test]
        fn default_is_active() {
            assert_eq!(AccountStatus::default(), AccountStatus::Active);
        }

        #[test]
        fn parse_is_case_insensitive() {
            assert_eq!("Locked".parse::<AccountStatus>().unwrap(), AccountStatus::Locked);
            assert_eq!(" disabled ".parse::<AccountStatus>().unwrap(), AccountStatus::Disabled);
            assert!("gone".parse::<AccountStatus>().is_err());
        }

        #[test]
        fn names_round_trip() {
            for status in [AccountStatus::Active, AccountStatus::Disabled, AccountStatus::Locked] {
                assert_eq!(status.as_str().parse::<AccountStatus>().unwrap(), status);
            }
        }
    }
}
