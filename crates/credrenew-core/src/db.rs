//! `SQLite` pool construction and timestamp encoding.
//!
//! Every repository takes a [`SqlitePool`] and creates its own tables, so the
//! registry and the ledger can share one database file (or one in-memory
//! database in tests).

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::{Error, Result};

/// Opens (creating if needed) the database file at `path`.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the
/// connection fails.
pub async fn open(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let url = format!("sqlite:{}?mode=rwc", path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;
    Ok(pool)
}

/// Opens a private in-memory database.
///
/// The pool holds a single connection that never expires, since an in-memory
/// database lives exactly as long as its connection.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}

/// Encodes a timestamp as fixed-width RFC 3339 (microseconds, `Z`), which
/// sorts lexicographically in time order.
pub(crate) fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decodes a timestamp written by [`encode_time`].
pub(crate) fn decode_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Corrupt(format!("bad timestamp {raw:?}: {e}")))
}
