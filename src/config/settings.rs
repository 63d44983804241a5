//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub gate: GateConfig,
    pub reminders: ReminderConfig,
    pub broadcast: BroadcastConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    pub owner_id: i64,
    pub username: String,
}

/// Which record store backs the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Postgres,
    Memory,
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Mandatory-group gate configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GateConfig {
    /// How long a join-status cache entry stays fresh
    pub cache_ttl_seconds: u64,
    /// Upper bound for a single membership lookup
    pub check_timeout_seconds: u64,
}

/// Reminder scanner configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReminderConfig {
    pub scan_period_seconds: u64,
    pub snooze_minutes: u32,
    pub send_notifications: bool,
}

/// Broadcast fan-out configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BroadcastConfig {
    pub messages_per_second: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
}

impl Settings {
    /// Load settings from defaults, an optional `config` file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("KAPANBAYAR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::KapanBayarError> {
        super::validation::validate_settings(self)
    }
}

impl GateConfig {
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_seconds as i64)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_seconds)
    }
}

impl ReminderConfig {
    pub fn scan_period(&self) -> Duration {
        Duration::from_secs(self.scan_period_seconds)
    }

    pub fn snooze(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.snooze_minutes as i64)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                owner_id: 0,
                username: "KapanBayarBot".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::File,
                data_dir: "data".to_string(),
                database_url: None,
                max_connections: 5,
                min_connections: 1,
            },
            gate: GateConfig {
                cache_ttl_seconds: 300,
                check_timeout_seconds: 10,
            },
            reminders: ReminderConfig {
                scan_period_seconds: 60,
                snooze_minutes: 60,
                send_notifications: true,
            },
            broadcast: BroadcastConfig {
                messages_per_second: 20,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
            },
        }
    }
}
