//! Engine configuration.
//!
//! Loaded from a JSON file, by default `<config_dir>/credrenew/config.json`.
//! Every field has a default, so an empty object is a valid configuration.

use std::path::{Path, PathBuf};

use chrono::Duration;
use credrenew_browser::{LoginSurface, WebDriverConfig};
use credrenew_vault::{KeySource, VaultKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ledger::DEFAULT_RETENTION_DAYS;
use crate::notify::ChannelConfig;
use crate::scheduler::DEFAULT_MIN_INTERVAL_HOURS;
use crate::{Error, Result};

/// Application directory name under the platform config/data dirs.
const APP_DIR: &str = "credrenew";

/// Default claim lifetime.
pub const DEFAULT_CLAIM_TTL_MINUTES: u32 = 30;

/// Engine configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `SQLite` database file.
    pub database_path: PathBuf,
    /// Base64 vault key; when absent the environment and keyring are used.
    pub vault_key: Option<String>,
    /// Minimum hours between two attempts on one account.
    pub min_interval_hours: u32,
    /// Minutes after which an unreleased claim lapses.
    pub claim_ttl_minutes: u32,
    /// Days audit log entries are kept.
    pub log_retention_days: u32,
    /// WebDriver endpoint.
    pub webdriver: WebDriverConfig,
    /// Login surface description.
    pub login: LoginSurface,
    /// Notification channels.
    pub notifications: Vec<ChannelConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            vault_key: None,
            min_interval_hours: DEFAULT_MIN_INTERVAL_HOURS,
            claim_ttl_minutes: DEFAULT_CLAIM_TTL_MINUTES,
            log_retention_days: DEFAULT_RETENTION_DAYS,
            webdriver: WebDriverConfig::default(),
            login: LoginSurface::default(),
            notifications: Vec::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("vault_key", &self.vault_key.as_ref().map(|_| "[REDACTED]"))
            .field("min_interval_hours", &self.min_interval_hours)
            .field("claim_ttl_minutes", &self.claim_ttl_minutes)
            .field("log_retention_days", &self.log_retention_days)
            .field("webdriver", &self.webdriver)
            .field("login", &self.login)
            .field("notifications", &self.notifications)
            .finish()
    }
}

/// Default database location: `<data_dir>/credrenew/credrenew.db`.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("credrenew.db")
}

impl Config {
    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads `path`, or the defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is invalid.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            info!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path).await
    }

    /// Writes the configuration as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.min_interval_hours == 0 {
            return Err(Error::Config("min_interval_hours must be positive".into()));
        }
        if self.claim_ttl_minutes == 0 {
            return Err(Error::Config("claim_ttl_minutes must be positive".into()));
        }
        if self.log_retention_days == 0 {
            return Err(Error::Config("log_retention_days must be positive".into()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("database_path is empty".into()));
        }
        url::Url::parse(&self.webdriver.endpoint).map_err(|e| {
            Error::Config(format!("webdriver.endpoint {:?}: {e}", self.webdriver.endpoint))
        })?;
        url::Url::parse(&self.login.login_url).map_err(|e| {
            Error::Config(format!("login.login_url {:?}: {e}", self.login.login_url))
        })?;
        Ok(())
    }

    /// Minimum interval between attempts.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::hours(i64::from(self.min_interval_hours))
    }

    /// Claim lifetime.
    #[must_use]
    pub fn claim_ttl(&self) -> Duration {
        Duration::minutes(i64::from(self.claim_ttl_minutes))
    }

    /// Resolves the vault key from this configuration, the environment or
    /// the system keyring.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vault`] if no source holds a well-formed key.
    pub fn resolve_vault_key(&self) -> Result<(VaultKey, KeySource)> {
        Ok(credrenew_vault::resolve_key(self.vault_key.as_deref())?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.min_interval(), Duration::hours(25));
        assert_eq!(config.claim_ttl(), Duration::minutes(30));
        assert_eq!(config.log_retention_days, 90);
        assert!(config.notifications.is_empty());
        assert_eq!(config.webdriver, WebDriverConfig::default());
        assert!(config.database_path.ends_with("credrenew/credrenew.db"));
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_json(
            r#"{
                "database_path": "/var/lib/credrenew/state.db",
                "min_interval_hours": 48,
                "login": {"login_url": "https://login.example.com/"},
                "notifications": [{"type": "log"}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.min_interval(), Duration::hours(48));
        assert_eq!(config.login.login_url, "https://login.example.com/");
        assert_eq!(
            config.login.landing_url_pattern,
            LoginSurface::default().landing_url_pattern
        );
        assert_eq!(config.notifications.len(), 1);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(matches!(
            Config::from_json(r#"{"min_interval_hours": 0}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"webdriver": {"endpoint": "not a url"}}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(Config::from_json("[1, 2]"), Err(Error::Serde(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config {
            vault_key: Some("c2VjcmV0".into()),
            ..Config::default()
        };
        assert!(!format!("{config:?}").contains("c2VjcmV0"));
    }

    #[test]
    fn test_configured_key_resolves() {
        let key = VaultKey::generate();
        let config = Config {
            vault_key: Some(key.to_base64()),
            ..Config::default()
        };
        let (resolved, source) = config.resolve_vault_key().unwrap();
        assert_eq!(source, KeySource::Config);
        assert_eq!(resolved.to_base64(), key.to_base64());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("credrenew-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.json");

        let missing = Config::load_or_default(&path).await.unwrap();
        assert_eq!(missing.min_interval_hours, 25);

        let config = Config {
            min_interval_hours: 30,
            ..Config::default()
        };
        config.save(&path).await.unwrap();
        let loaded = Config::load(&path).await.unwrap();
        assert_eq!(loaded.min_interval_hours, 30);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
