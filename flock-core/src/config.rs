//! Application configuration management.
//!
//! Configuration is persisted as TOML. Every field has a default so a
//! missing file, or a file with only some sections, still loads.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{FlockError, FlockResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Messaging provider credentials and endpoint.
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Daily job schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. If empty, uses default location.
    #[serde(default)]
    pub path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Run integrity check on startup.
    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

/// Messaging provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Provider REST API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Provider account identifier.
    #[serde(default)]
    pub account_sid: String,

    /// Provider auth token.
    #[serde(default)]
    pub auth_token: String,

    /// Sender number, without the channel prefix.
    #[serde(default)]
    pub from_number: String,

    /// Channel prefix applied to both sender and recipient ("whatsapp", "sms" or empty).
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_api_timeout")]
    pub timeout_ms: u64,

    /// Retries after the first attempt on retryable failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Daily job schedule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local wall-clock time the job runs at ("HH:MM").
    #[serde(default = "default_send_time")]
    pub send_time: String,

    /// Days ahead of an event its reminder goes out.
    #[serde(default = "default_reminder_lead_days")]
    pub reminder_lead_days: u32,

    /// Send event reminders.
    #[serde(default = "default_true")]
    pub reminders_enabled: bool,

    /// Send birthday greetings.
    #[serde(default = "default_true")]
    pub birthdays_enabled: bool,

    /// Restrict the reminder roster to members with status Active.
    #[serde(default)]
    pub active_members_only: bool,
}

// Default value functions for serde

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_channel() -> String {
    "whatsapp".to_string()
}

fn default_api_timeout() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_send_time() -> String {
    constants::DEFAULT_SEND_TIME.to_string()
}

fn default_reminder_lead_days() -> u32 {
    constants::DEFAULT_REMINDER_LEAD_DAYS
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            channel: default_channel(),
            timeout_ms: default_api_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            send_time: default_send_time(),
            reminder_lead_days: default_reminder_lead_days(),
            reminders_enabled: true,
            birthdays_enabled: true,
            active_members_only: false,
        }
    }
}

impl MessagingConfig {
    /// Check that credentials and sender are present.
    pub fn validate(&self) -> FlockResult<()> {
        if self.account_sid.trim().is_empty() {
            return Err(FlockError::MissingConfig("messaging.account_sid".into()));
        }
        if self.auth_token.trim().is_empty() {
            return Err(FlockError::MissingConfig("messaging.auth_token".into()));
        }
        if self.from_number.trim().is_empty() {
            return Err(FlockError::MissingConfig("messaging.from_number".into()));
        }
        Ok(())
    }

    /// Apply the channel prefix to a phone number ("whatsapp:+27...").
    pub fn address(&self, number: &str) -> String {
        let number = number.trim();
        if self.channel.is_empty() || number.contains(':') {
            number.to_string()
        } else {
            format!("{}:{number}", self.channel)
        }
    }
}

impl ScheduleConfig {
    /// Parse `send_time` into a wall-clock time.
    pub fn send_time(&self) -> FlockResult<chrono::NaiveTime> {
        chrono::NaiveTime::parse_from_str(self.send_time.trim(), "%H:%M")
            .map_err(|e| FlockError::Config(format!("schedule.send_time '{}': {e}", self.send_time)))
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> FlockResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> FlockResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> FlockResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| FlockError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> FlockResult<PathBuf> {
        Ok(Platform::config_dir()?.join("config.toml"))
    }

    /// Get the effective database path, using the configured path or the default.
    pub fn effective_db_path(&self) -> FlockResult<PathBuf> {
        if self.database.path.is_empty() {
            Ok(Platform::data_dir()?.join(constants::DB_FILE_NAME))
        } else {
            Ok(PathBuf::from(&self.database.path))
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> FlockResult<PathBuf> {
        if self.logging.directory.is_empty() {
            Ok(Platform::data_dir()?.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }
}

/// Thread-safe configuration holder for shared access across services.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the lock.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.database.wal_mode);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.schedule.reminder_lead_days, 5);
        assert_eq!(config.schedule.send_time, "08:00");
        assert_eq!(config.messaging.channel, "whatsapp");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            "[schedule]\nsend_time = \"07:30\"\n\n[messaging]\naccount_sid = \"AC123\"\n",
        )
        .unwrap();
        assert_eq!(config.schedule.send_time, "07:30");
        assert_eq!(config.schedule.reminder_lead_days, 5);
        assert_eq!(config.messaging.account_sid, "AC123");
        assert_eq!(config.messaging.api_base_url, "https://api.twilio.com");
        assert_eq!(config.database.pool_size, 4);
    }

    #[test]
    fn test_send_time_parsing() {
        let mut schedule = ScheduleConfig::default();
        assert_eq!(
            schedule.send_time().unwrap(),
            chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
        schedule.send_time = "25:00".into();
        assert!(matches!(schedule.send_time(), Err(FlockError::Config(_))));
    }

    #[test]
    fn test_messaging_validate_and_address() {
        let mut messaging = MessagingConfig::default();
        assert!(matches!(messaging.validate(), Err(FlockError::MissingConfig(_))));

        messaging.account_sid = "AC1".into();
        messaging.auth_token = "secret".into();
        messaging.from_number = "+14155238886".into();
        assert!(messaging.validate().is_ok());

        assert_eq!(messaging.address(" +27781205705 "), "whatsapp:+27781205705");
        assert_eq!(messaging.address("whatsapp:+1"), "whatsapp:+1");

        messaging.channel.clear();
        assert_eq!(messaging.address("+27781205705"), "+27781205705");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.database.path = "/tmp/church.db".into();
        config.schedule.active_members_only = true;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.database.path, "/tmp/church.db");
        assert!(loaded.schedule.active_members_only);
        assert_eq!(loaded.effective_db_path().unwrap(), PathBuf::from("/tmp/church.db"));
    }

    #[tokio::test]
    async fn test_config_handle_write_is_visible() {
        let handle = ConfigHandle::new(AppConfig::default());
        handle.write().await.schedule.reminder_lead_days = 3;
        assert_eq!(handle.read().await.schedule.reminder_lead_days, 3);
        assert_eq!(handle.snapshot().await.schedule.reminder_lead_days, 3);
    }
}
