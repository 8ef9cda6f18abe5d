//! Plaintext credentials and their sealing into vault ciphertext.
//!
//! Each field is sealed under its own nonce, derived from the account IV
//! with [`Iv::for_field`] and a fixed slot number, so one key never sees the
//! same nonce twice for a given account.

use std::fmt;

use credrenew_vault::{Iv, VaultKey, open, seal};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::model::SealedSecrets;
use crate::Result;

/// Nonce slot of the login identifier.
pub const IDENTIFIER_SLOT: u8 = 0;
/// Nonce slot of the passphrase.
pub const SECRET_SLOT: u8 = 1;
/// Nonce slot of the one-time-code seed.
pub const OTP_SEED_SLOT: u8 = 2;

/// Decrypted credentials for one account.
///
/// Memory is wiped on drop and `Debug` never prints the values.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    /// Login identifier (usually an email address).
    pub identifier: String,
    /// Passphrase.
    pub secret: String,
    /// Base32 one-time-code seed.
    pub otp_seed: String,
}

impl Credentials {
    /// Creates a credential triple.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        secret: impl Into<String>,
        otp_seed: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            otp_seed: otp_seed.into(),
        }
    }

    /// Encrypts every field under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    pub fn seal(&self, key: &VaultKey, iv: &Iv) -> Result<SealedSecrets> {
        Ok(SealedSecrets {
            identifier: seal(&self.identifier, key, &iv.for_field(IDENTIFIER_SLOT))?,
            secret: seal(&self.secret, key, &iv.for_field(SECRET_SLOT))?,
            otp_seed: seal(&self.otp_seed, key, &iv.for_field(OTP_SEED_SLOT))?,
        })
    }

    /// Decrypts sealed secrets.
    ///
    /// # Errors
    ///
    /// Returns a vault integrity error for a wrong key or tampered
    /// ciphertext; no field is returned in that case.
    pub fn open(sealed: &SealedSecrets, key: &VaultKey, iv: &Iv) -> Result<Self> {
        Ok(Self {
            identifier: open(&sealed.identifier, key, &iv.for_field(IDENTIFIER_SLOT))?,
            secret: open(&sealed.secret, key, &iv.for_field(SECRET_SLOT))?,
            otp_seed: open(&sealed.otp_seed, key, &iv.for_field(OTP_SEED_SLOT))?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &"<redacted>")
            .field("secret", &"<redacted>")
            .field("otp_seed", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;

    fn sample() -> Credentials {
        Credentials::new("user@example.com", "hunter2", "JBSWY3DPEHPK3PXP")
    }

    #[test]
    fn test_seal_open_round_trip() {
        let key = VaultKey::generate();
        let iv = Iv::generate();
        let sealed = sample().seal(&key, &iv).unwrap();
        assert_eq!(Credentials::open(&sealed, &key, &iv).unwrap(), sample());
    }

    #[test]
    fn test_sealed_fields_hide_plaintext() {
        let key = VaultKey::generate();
        let iv = Iv::generate();
        let sealed = sample().seal(&key, &iv).unwrap();
        assert!(!sealed.identifier.contains("user@example.com"));
        assert!(!sealed.secret.contains("hunter2"));
    }

    #[test]
    fn test_identical_fields_get_distinct_ciphertext() {
        let key = VaultKey::generate();
        let iv = Iv::generate();
        let creds = Credentials::new("same", "same", "same");
        let sealed = creds.seal(&key, &iv).unwrap();
        assert_ne!(sealed.identifier, sealed.secret);
        assert_ne!(sealed.secret, sealed.otp_seed);
        assert_ne!(sealed.identifier, sealed.otp_seed);
    }

    #[test]
    fn test_wrong_key_fails_integrity() {
        let iv = Iv::generate();
        let sealed = sample().seal(&VaultKey::generate(), &iv).unwrap();
        let result = Credentials::open(&sealed, &VaultKey::generate(), &iv);
        assert!(matches!(
            result,
            Err(Error::Vault(credrenew_vault::Error::Integrity))
        ));
    }

    #[test]
    fn test_swapped_fields_fail_integrity() {
        let key = VaultKey::generate();
        let iv = Iv::generate();
        let mut sealed = sample().seal(&key, &iv).unwrap();
        std::mem::swap(&mut sealed.identifier, &mut sealed.secret);
        assert!(Credentials::open(&sealed, &key, &iv).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let debug = format!("{:?}", sample());
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("user@example.com"));
        assert!(debug.contains("<redacted>"));
    }
}
