//! Ledger storage: processing state, audit log and claims.

use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use tracing::debug;
use uuid::Uuid;

use super::model::{ProcessingLogEntry, ProcessingState, ProcessingStatus, RenewalClaim};
use crate::db::{decode_time, encode_time};
use crate::{AccountId, Error, Result};

/// Default retention of audit log entries.
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Repository for the processing ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
    retention: Duration,
}

impl LedgerRepository {
    /// Creates a ledger on an existing pool and ensures its tables exist.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let repo = Self {
            pool,
            retention: Duration::days(i64::from(DEFAULT_RETENTION_DAYS)),
        };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Sets how long audit log entries are retained.
    #[must_use]
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention = Duration::days(i64::from(days));
        self
    }

    /// Returns the audit log retention.
    #[must_use]
    pub const fn retention(&self) -> Duration {
        self.retention
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS processing_state (
                account_id TEXT PRIMARY KEY NOT NULL,
                last_processed_at TEXT,
                last_status TEXT NOT NULL,
                last_message TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS processing_log (
                log_id TEXT PRIMARY KEY NOT NULL,
                account_id TEXT NOT NULL,
                processed_at TEXT NOT NULL,
                status TEXT NOT NULL,
                message TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_processing_log_account
            ON processing_log(account_id, processed_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_processing_log_expires
            ON processing_log(expires_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS renewal_claims (
                account_id TEXT PRIMARY KEY NOT NULL,
                owner TEXT NOT NULL,
                claimed_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Overwrites the current state record of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_state(
        &self,
        account_id: AccountId,
        status: ProcessingStatus,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_state(&mut conn, account_id, status, message, at).await
    }

    /// Appends an immutable audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append_log(
        &self,
        account_id: AccountId,
        status: ProcessingStatus,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<ProcessingLogEntry> {
        let entry = self.log_entry(account_id, status, message, at);
        let mut conn = self.pool.acquire().await?;
        insert_log(&mut conn, &entry).await?;
        Ok(entry)
    }

    /// Records a completed attempt: state upsert and log append in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails; nothing is written in that case.
    pub async fn record(
        &self,
        account_id: AccountId,
        status: ProcessingStatus,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<ProcessingLogEntry> {
        let entry = self.log_entry(account_id, status, message, at);

        let mut tx = self.pool.begin().await?;
        upsert_state(&mut tx, account_id, status, message, at).await?;
        insert_log(&mut tx, &entry).await?;
        tx.commit().await?;

        debug!("Recorded {status} for account {account_id}");
        Ok(entry)
    }

    /// Returns the current state of an account, if it was ever processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt.
    pub async fn get_state(&self, account_id: AccountId) -> Result<Option<ProcessingState>> {
        let row = sqlx::query(
            r"
            SELECT account_id, last_processed_at, last_status, last_message, updated_at
            FROM processing_state
            WHERE account_id = ?
            ",
        )
        .bind(account_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_state).transpose()
    }

    /// Returns every current state record.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn list_states(&self) -> Result<Vec<ProcessingState>> {
        let rows = sqlx::query(
            r"
            SELECT account_id, last_processed_at, last_status, last_message, updated_at
            FROM processing_state
            ORDER BY account_id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_state).collect()
    }

    /// Returns up to `limit` audit entries of an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn history(
        &self,
        account_id: AccountId,
        limit: u32,
    ) -> Result<Vec<ProcessingLogEntry>> {
        let rows = sqlx::query(
            r"
            SELECT log_id, account_id, processed_at, status, message, expires_at
            FROM processing_log
            WHERE account_id = ?
            ORDER BY processed_at DESC, rowid DESC
            LIMIT ?
            ",
        )
        .bind(account_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_log_entry).collect()
    }

    /// Deletes audit entries whose retention horizon is at or before `now`.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM processing_log WHERE expires_at <= ?")
            .bind(encode_time(now))
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!("Pruned {removed} expired log entries");
        }
        Ok(removed)
    }

    /// Takes the claim on an account for `owner` unless a live claim exists.
    ///
    /// An expired claim is taken over. Returns true if `owner` now holds the
    /// claim.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn claim(
        &self,
        account_id: AccountId,
        owner: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool> {
        let now_ms = now.timestamp_millis();
        let expires_ms = (now + ttl).timestamp_millis();

        let result = sqlx::query(
            r"
            INSERT INTO renewal_claims (account_id, owner, claimed_at, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(account_id) DO UPDATE SET
                owner = excluded.owner,
                claimed_at = excluded.claimed_at,
                expires_at = excluded.expires_at
            WHERE renewal_claims.expires_at <= ?
            ",
        )
        .bind(account_id.to_string())
        .bind(owner.to_string())
        .bind(now_ms)
        .bind(expires_ms)
        .bind(now_ms)
        .execute(&self.pool)
        .await?;

        let claimed = result.rows_affected() > 0;
        debug!("Claim on account {account_id} by {owner}: {claimed}");
        Ok(claimed)
    }

    /// Releases a claim held by `owner`. Returns false if `owner` did not hold
    /// it.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn release(&self, account_id: AccountId, owner: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM renewal_claims WHERE account_id = ? AND owner = ?")
            .bind(account_id.to_string())
            .bind(owner.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns the claim row of an account, live or expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt.
    pub async fn get_claim(&self, account_id: AccountId) -> Result<Option<RenewalClaim>> {
        let row = sqlx::query(
            r"
            SELECT account_id, owner, claimed_at, expires_at
            FROM renewal_claims
            WHERE account_id = ?
            ",
        )
        .bind(account_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_claim).transpose()
    }

    fn log_entry(
        &self,
        account_id: AccountId,
        status: ProcessingStatus,
        message: &str,
        at: DateTime<Utc>,
    ) -> ProcessingLogEntry {
        ProcessingLogEntry {
            log_id: Uuid::new_v4(),
            account_id,
            processed_at: at,
            status,
            message: message.to_string(),
            expires_at: at + self.retention,
        }
    }
}

async fn upsert_state(
    conn: &mut SqliteConnection,
    account_id: AccountId,
    status: ProcessingStatus,
    message: &str,
    at: DateTime<Utc>,
) -> Result<()> {
    let at = encode_time(at);
    sqlx::query(
        r"
        INSERT INTO processing_state (
            account_id, last_processed_at, last_status, last_message, updated_at
        ) VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(account_id) DO UPDATE SET
            last_processed_at = excluded.last_processed_at,
            last_status = excluded.last_status,
            last_message = excluded.last_message,
            updated_at = excluded.updated_at
        ",
    )
    .bind(account_id.to_string())
    .bind(&at)
    .bind(status.as_str())
    .bind(message)
    .bind(&at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_log(conn: &mut SqliteConnection, entry: &ProcessingLogEntry) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO processing_log (
            log_id, account_id, processed_at, status, message, expires_at
        ) VALUES (?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(entry.log_id.to_string())
    .bind(entry.account_id.to_string())
    .bind(encode_time(entry.processed_at))
    .bind(entry.status.as_str())
    .bind(&entry.message)
    .bind(encode_time(entry.expires_at))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn parse_status(raw: &str) -> Result<ProcessingStatus> {
    raw.parse()
        .map_err(|_| Error::Corrupt(format!("unknown processing status {raw:?}")))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Corrupt(format!("bad uuid {raw:?}: {e}")))
}

fn decode_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::Corrupt(format!("claim time {ms} out of range")))
}

fn row_to_state(row: &SqliteRow) -> Result<ProcessingState> {
    let last_processed_at: Option<String> = row.get("last_processed_at");
    Ok(ProcessingState {
        account_id: AccountId::new(parse_uuid(row.get("account_id"))?),
        last_processed_at: last_processed_at.as_deref().map(decode_time).transpose()?,
        last_status: parse_status(row.get("last_status"))?,
        last_message: row.get("last_message"),
        updated_at: decode_time(row.get("updated_at"))?,
    })
}

fn row_to_log_entry(row: &SqliteRow) -> Result<ProcessingLogEntry> {
    Ok(ProcessingLogEntry {
        log_id: parse_uuid(row.get("log_id"))?,
        account_id: AccountId::new(parse_uuid(row.get("account_id"))?),
        processed_at: decode_time(row.get("processed_at"))?,
        status: parse_status(row.get("status"))?,
        message: row.get("message"),
        expires_at: decode_time(row.get("expires_at"))?,
    })
}

fn row_to_claim(row: &SqliteRow) -> Result<RenewalClaim> {
    Ok(RenewalClaim {
        account_id: AccountId::new(parse_uuid(row.get("account_id"))?),
        owner: parse_uuid(row.get("owner"))?,
        claimed_at: decode_millis(row.get("claimed_at"))?,
        expires_at: decode_millis(row.get("expires_at"))?,
    })
}
