//! Service layer.
//!
//! Wires the registry, ledger, vault key, login flow and notifications
//! together for the store/fetch boundary and the renewal run.

pub mod credentials;
pub mod renewal;

pub use credentials::CredentialService;
pub use renewal::{RenewalEngine, RunReport};

use credrenew_browser::{LoginFlow, WebDriver};

use crate::account::AccountRepository;
use crate::config::Config;
use crate::ledger::LedgerRepository;
use crate::{Error, Result, db};

/// Both repositories on one database.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Account registry.
    pub accounts: AccountRepository,
    /// Processing ledger.
    pub ledger: LedgerRepository,
}

impl Storage {
    /// Opens the database named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::open(&config.database_path).await?;
        Self::on_pool(pool, config.log_retention_days).await
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub async fn in_memory() -> Result<Self> {
        let pool = db::in_memory().await?;
        Self::on_pool(pool, crate::ledger::DEFAULT_RETENTION_DAYS).await
    }

    async fn on_pool(pool: sqlx::SqlitePool, retention_days: u32) -> Result<Self> {
        Ok(Self {
            accounts: AccountRepository::new(pool.clone()).await?,
            ledger: LedgerRepository::new(pool)
                .await?
                .with_retention_days(retention_days),
        })
    }
}

/// Builds the production login flow: WebDriver transport plus the configured
/// login surface.
///
/// # Errors
///
/// Returns [`Error::Config`] if the WebDriver client cannot be built.
pub fn login_flow(config: &Config) -> Result<LoginFlow<WebDriver>> {
    let driver = WebDriver::new(config.webdriver.clone())
        .map_err(|e| Error::Config(format!("webdriver: {e}")))?;
    Ok(LoginFlow::new(driver, config.login.clone()))
}
