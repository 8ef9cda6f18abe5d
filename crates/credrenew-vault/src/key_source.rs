//! Resolution of the process-wide vault key.
//!
//! The key is looked up, in order, from:
//! - an explicitly configured base64 value
//! - the `CREDRENEW_VAULT_KEY` environment variable
//! - the platform keyring (Secret Service, Keychain, Credential Manager)

use keyring::Entry;
use tracing::debug;

use crate::cipher::VaultKey;
use crate::error::{Error, Result};

/// Environment variable holding the base64 vault key.
pub const KEY_ENV_VAR: &str = "CREDRENEW_VAULT_KEY";

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "credrenew";

/// Keyring entry holding the vault key.
const KEY_ENTRY: &str = "vault_key";

/// Where the resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Configuration file value.
    Config,
    /// Environment variable.
    Environment,
    /// System keyring.
    Keyring,
}

/// Resolves the vault key from the configured value, the environment, or the
/// system keyring.
///
/// A source that is present but malformed is an error; it does not fall
/// through to the next source.
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] for a malformed key, [`Error::Keyring`] if the
/// keyring cannot be queried, and [`Error::KeyNotConfigured`] if no source
/// holds a key.
pub fn resolve_key(configured: Option<&str>) -> Result<(VaultKey, KeySource)> {
    if let Some(value) = configured.filter(|v| !v.trim().is_empty()) {
        return Ok((VaultKey::from_base64(value)?, KeySource::Config));
    }

    if let Ok(value) = std::env::var(KEY_ENV_VAR)
        && !value.trim().is_empty()
    {
        debug!("Using vault key from {KEY_ENV_VAR}");
        return Ok((VaultKey::from_base64(&value)?, KeySource::Environment));
    }

    let entry = Entry::new(SERVICE_NAME, KEY_ENTRY)?;
    match entry.get_password() {
        Ok(value) => {
            debug!("Using vault key from system keyring");
            Ok((VaultKey::from_base64(&value)?, KeySource::Keyring))
        }
        Err(keyring::Error::NoEntry) => Err(Error::KeyNotConfigured(KEY_ENV_VAR)),
        Err(e) => Err(e.into()),
    }
}

/// Stores the vault key in the system keyring, replacing any existing key.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn store_in_keyring(key: &VaultKey) -> Result<()> {
    let entry = Entry::new(SERVICE_NAME, KEY_ENTRY)?;
    entry.set_password(&key.to_base64())?;
    debug!("Stored vault key in keyring");
    Ok(())
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

    #[test]
    fn test_configured_key_wins() {
        let key = VaultKey::generate();
        let (resolved, source) = resolve_key(Some(&key.to_base64())).unwrap();
        assert_eq!(source, KeySource::Config);
        assert_eq!(resolved.to_base64(), key.to_base64());
    }

    #[test]
    fn test_malformed_configured_key_is_rejected() {
        let result = resolve_key(Some("too-short"));
        assert!(matches!(result, Err(Error::InvalidKey(_))));
    }

    // Note: this test interacts with the actual system keyring.
    // Run manually with `cargo test -- --ignored`
    #[test]
    #[ignore = "Interacts with system keyring"]
    fn test_store_and_resolve_from_keyring() {
        let key = VaultKey::generate();
        store_in_keyring(&key).unwrap();
        let (resolved, _) = resolve_key(None).unwrap();
        assert_eq!(resolved.to_base64(), key.to_base64());
    }
}
