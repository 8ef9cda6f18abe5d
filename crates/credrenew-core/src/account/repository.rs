//! Account storage repository.

use chrono::{DateTime, Utc};
use credrenew_vault::Iv;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::debug;

use super::model::{Account, AccountId, AccountStatus, SealedSecrets};
use crate::db::{decode_time, encode_time};
use crate::{Error, Result};

/// Repository for account storage and retrieval.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a repository on an existing pool and ensures its table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Creates a repository on a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        Self::new(crate::db::in_memory().await?).await
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY NOT NULL,
                identifier_ct TEXT NOT NULL,
                secret_ct TEXT NOT NULL,
                otp_seed_ct TEXT NOT NULL,
                iv TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_accounts_status ON accounts(status, created_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Stores a new active account and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, secrets: &SealedSecrets, iv: &Iv) -> Result<AccountId> {
        self.create_at(secrets, iv, Utc::now()).await
    }

    /// Stores a new active account with an explicit creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_at(
        &self,
        secrets: &SealedSecrets,
        iv: &Iv,
        created_at: DateTime<Utc>,
    ) -> Result<AccountId> {
        let id = AccountId::generate();
        let now = encode_time(created_at);

        sqlx::query(
            r"
            INSERT INTO accounts (
                id, identifier_ct, secret_ct, otp_seed_ct, iv, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id.to_string())
        .bind(&secrets.identifier)
        .bind(&secrets.secret)
        .bind(&secrets.otp_seed)
        .bind(iv.to_base64())
        .bind(AccountStatus::Active.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!("Stored account {id}");
        Ok(id)
    }

    /// Get account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt.
    pub async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r"
            SELECT id, identifier_ct, secret_ct, otp_seed_ct, iv, status, created_at, updated_at
            FROM accounts
            WHERE id = ?
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Changes an account's status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if no account has this id.
    pub async fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<()> {
        let result = sqlx::query("UPDATE accounts SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(encode_time(Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AccountNotFound(id));
        }
        debug!("Account {id} is now {status}");
        Ok(())
    }

    /// Get all accounts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn list(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r"
            SELECT id, identifier_ct, secret_ct, otp_seed_ct, iv, status, created_at, updated_at
            FROM accounts
            ORDER BY created_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_account).collect()
    }

    /// Get all accounts with the given status, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn list_by_status(&self, status: AccountStatus) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r"
            SELECT id, identifier_ct, secret_ct, otp_seed_ct, iv, status, created_at, updated_at
            FROM accounts
            WHERE status = ?
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_account).collect()
    }
}

/// Convert a database row to an Account.
fn row_to_account(row: &SqliteRow) -> Result<Account> {
    let id: String = row.get("id");
    let iv: String = row.get("iv");
    let status: String = row.get("status");

    Ok(Account {
        id: id.parse()?,
        secrets: SealedSecrets {
            identifier: row.get("identifier_ct"),
            secret: row.get("secret_ct"),
            otp_seed: row.get("otp_seed_ct"),
        },
        iv: Iv::from_base64(&iv).map_err(|e| Error::Corrupt(format!("account {id} iv: {e}")))?,
        status: status
            .parse()
            .map_err(|_| Error::Corrupt(format!("account {id} status {status:?}")))?,
        created_at: decode_time(row.get("created_at"))?,
        updated_at: decode_time(row.get("updated_at"))?,
    })
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
    use chrono::Duration;

    use super::*;

    fn secrets(tag: &str) -> SealedSecrets {
        SealedSecrets {
            identifier: format!("{tag}-id"),
            secret: format!("{tag}-secret"),
            otp_seed: format!("{tag}-seed"),
        }
    }

    #[tokio::test]
    async fn test_create_and_retrieve_account() {
        let repo = AccountRepository::in_memory().await.unwrap();
        let iv = Iv::generate();

        let id = repo.create(&secrets("a"), &iv).await.unwrap();
        let account = repo.get(id).await.unwrap().unwrap();

        assert_eq!(account.id, id);
        assert_eq!(account.secrets, secrets("a"));
        assert_eq!(account.iv, iv);
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.created_at, account.updated_at);
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let repo = AccountRepository::in_memory().await.unwrap();
        assert!(repo.get(AccountId::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_status() {
        let repo = AccountRepository::in_memory().await.unwrap();
        let id = repo.create(&secrets("a"), &Iv::generate()).await.unwrap();

        repo.set_status(id, AccountStatus::Locked).await.unwrap();
        let account = repo.get(id).await.unwrap().unwrap();
        assert_eq!(account.status, AccountStatus::Locked);
        assert!(account.updated_at >= account.created_at);
    }

    #[tokio::test]
    async fn test_set_status_unknown_account() {
        let repo = AccountRepository::in_memory().await.unwrap();
        let missing = AccountId::generate();
        let err = repo
            .set_status(missing, AccountStatus::Disabled)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AccountNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_list_oldest_first_and_by_status() {
        let repo = AccountRepository::in_memory().await.unwrap();
        let base = Utc::now() - Duration::days(3);

        let newest = repo
            .create_at(&secrets("c"), &Iv::generate(), base + Duration::days(2))
            .await
            .unwrap();
        let oldest = repo
            .create_at(&secrets("a"), &Iv::generate(), base)
            .await
            .unwrap();
        let middle = repo
            .create_at(&secrets("b"), &Iv::generate(), base + Duration::days(1))
            .await
            .unwrap();
        repo.set_status(middle, AccountStatus::Disabled).await.unwrap();

        let all: Vec<_> = repo.list().await.unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(all, vec![oldest, middle, newest]);

        let active: Vec<_> = repo
            .list_by_status(AccountStatus::Active)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(active, vec![oldest, newest]);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let repo = AccountRepository::in_memory().await.unwrap();
        let id = repo.create(&secrets("a"), &Iv::generate()).await.unwrap();
        sqlx::query("UPDATE accounts SET status = 'archived'")
            .execute(&repo.pool)
            .await
            .unwrap();
        assert!(matches!(repo.get(id).await, Err(Error::Corrupt(_))));
    }
}
