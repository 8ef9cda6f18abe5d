//! Ledger data models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AccountId, Error};

/// Outcome class of a renewal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// The login reached the authenticated landing page.
    Success,
    /// The attempt failed (decryption, automation or verification).
    Failure,
    /// The account was deliberately passed over.
    Skipped,
}

impl ProcessingStatus {
    /// Returns the stored/wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Skipped => "skipped",
        }
    }

    /// Maps a login result to a status.
    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Failure }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "skipped" => Ok(Self::Skipped),
            other => Err(Error::InvalidValue(format!("unknown processing status {other:?}"))),
        }
    }
}

/// Latest processing state of one account (latest write wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    /// Account this state belongs to.
    pub account_id: AccountId,
    /// When the account was last processed, if ever.
    pub last_processed_at: Option<DateTime<Utc>>,
    /// Status of the last attempt.
    pub last_status: ProcessingStatus,
    /// Message of the last attempt.
    pub last_message: String,
    /// When this record was last written.
    pub updated_at: DateTime<Utc>,
}

/// Immutable audit record of one renewal attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingLogEntry {
    /// Unique id of this entry.
    pub log_id: Uuid,
    /// Account the attempt was made for.
    pub account_id: AccountId,
    /// When the attempt completed.
    pub processed_at: DateTime<Utc>,
    /// Outcome class.
    pub status: ProcessingStatus,
    /// Outcome message.
    pub message: String,
    /// Retention horizon after which the entry may be pruned.
    pub expires_at: DateTime<Utc>,
}

/// Exclusive lease on an account held by one renewal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalClaim {
    /// Claimed account.
    pub account_id: AccountId,
    /// Run that holds the claim.
    pub owner: Uuid,
    /// When the claim was taken.
    pub claimed_at: DateTime<Utc>,
    /// When the claim lapses if not released.
    pub expires_at: DateTime<Utc>,
}

impl RenewalClaim {
    /// Returns true if the claim is still live at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("success".parse::<ProcessingStatus>().unwrap(), ProcessingStatus::Success);
        assert_eq!(" FAILURE ".parse::<ProcessingStatus>().unwrap(), ProcessingStatus::Failure);
        assert_eq!("skipped".parse::<ProcessingStatus>().unwrap(), ProcessingStatus::Skipped);
        assert!("done".parse::<ProcessingStatus>().is_err());
    }

    #[test]
    fn test_status_from_success() {
        assert_eq!(ProcessingStatus::from_success(true), ProcessingStatus::Success);
        assert_eq!(ProcessingStatus::from_success(false), ProcessingStatus::Failure);
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&ProcessingStatus::Skipped).unwrap();
        assert_eq!(json, "\"skipped\"");
    }
}
