//! Store/fetch boundary for account credentials.

use credrenew_vault::{Iv, VaultKey};
use tracing::info;

use crate::account::{Account, AccountId, AccountRepository, Credentials, validate_credentials};
use crate::{Error, Result};

/// Seals credentials on the way in and opens them on the way out.
///
/// Plaintext never reaches the registry.
#[derive(Clone)]
pub struct CredentialService {
    accounts: AccountRepository,
    key: VaultKey,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

impl CredentialService {
    /// Creates the service with the process-wide vault key.
    #[must_use]
    pub const fn new(accounts: AccountRepository, key: VaultKey) -> Self {
        Self { accounts, key }
    }

    /// Returns the account registry.
    #[must_use]
    pub const fn accounts(&self) -> &AccountRepository {
        &self.accounts
    }

    /// Validates, encrypts and stores a new active account.
    ///
    /// Values are sealed exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every invalid field, or an error
    /// if encryption or the insert fails.
    pub async fn store(&self, identifier: &str, secret: &str, otp_seed: &str) -> Result<AccountId> {
        let credentials = Credentials::new(identifier, secret, otp_seed);
        validate_credentials(&credentials).map_err(Error::Validation)?;

        let iv = Iv::generate();
        let sealed = credentials.seal(&self.key, &iv)?;
        let id = self.accounts.create(&sealed, &iv).await?;

        info!("Stored credentials for account {id}");
        Ok(id)
    }

    /// Returns the decrypted credentials of an account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] for an unknown id and
    /// [`Error::Vault`] if the ciphertext does not open under the key.
    pub async fn fetch_decrypted(&self, id: AccountId) -> Result<Credentials> {
        let account = self
            .accounts
            .get(id)
            .await?
            .ok_or(Error::AccountNotFound(id))?;
        self.decrypt(&account)
    }

    /// Decrypts an already loaded account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vault`] for a wrong key or tampered ciphertext.
    pub fn decrypt(&self, account: &Account) -> Result<Credentials> {
        Credentials::open(&account.secrets, &self.key, &account.iv)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::account::ValidationError;

    const SEED: &str = "JBSWY3DPEHPK3PXP";

    async fn service() -> CredentialService {
        CredentialService::new(
            AccountRepository::in_memory().await.unwrap(),
            VaultKey::generate(),
        )
    }

    #[tokio::test]
    async fn test_store_then_fetch() {
        let service = service().await;
        let id = service
            .store("user@example.com", "correct horse", SEED)
            .await
            .unwrap();

        let credentials = service.fetch_decrypted(id).await.unwrap();
        assert_eq!(
            credentials,
            Credentials::new("user@example.com", "correct horse", SEED)
        );
    }

    #[tokio::test]
    async fn test_fetch_returns_exact_stored_triple() {
        let service = service().await;
        let id = service.store("a@x.com", "p1", "SEED123").await.unwrap();

        let credentials = service.fetch_decrypted(id).await.unwrap();
        assert_eq!(credentials, Credentials::new("a@x.com", "p1", "SEED123"));
    }

    #[tokio::test]
    async fn test_store_keeps_surrounding_whitespace() {
        let service = service().await;
        let id = service
            .store("user@example.com", " pw ", " JBSW Y3DP ")
            .await
            .unwrap();

        let credentials = service.fetch_decrypted(id).await.unwrap();
        assert_eq!(credentials.secret.as_str(), " pw ");
        assert_eq!(credentials.otp_seed.as_str(), " JBSW Y3DP ");
    }

    #[tokio::test]
    async fn test_store_never_persists_plaintext() {
        let service = service().await;
        let id = service
            .store("user@example.com", "correct horse", SEED)
            .await
            .unwrap();

        let account = service.accounts().get(id).await.unwrap().unwrap();
        assert!(account.is_active());
        for sealed in [
            &account.secrets.identifier,
            &account.secrets.secret,
            &account.secrets.otp_seed,
        ] {
            assert!(!sealed.contains("user@example.com"));
            assert!(!sealed.contains("correct horse"));
            assert!(!sealed.contains(SEED));
        }
    }

    #[tokio::test]
    async fn test_store_rejects_invalid_input() {
        let service = service().await;
        let err = service.store("not-an-email", "", "  ").await.unwrap_err();
        let Error::Validation(errors) = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidIdentifier,
                ValidationError::EmptySecret,
                ValidationError::EmptyOtpSeed,
            ]
        );
        assert!(service.accounts().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_unknown_account() {
        let service = service().await;
        let missing = AccountId::generate();
        assert!(matches!(
            service.fetch_decrypted(missing).await,
            Err(Error::AccountNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn test_wrong_key_fails_integrity() {
        let service = service().await;
        let id = service
            .store("user@example.com", "pw", SEED)
            .await
            .unwrap();
        let other = CredentialService::new(service.accounts().clone(), VaultKey::generate());

        assert!(matches!(
            other.fetch_decrypted(id).await,
            Err(Error::Vault(credrenew_vault::Error::Integrity))
        ));
    }
}
