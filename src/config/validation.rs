//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{KapanBayarError, Result};
use super::{Settings, StorageBackend};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_storage_config(&settings.storage)?;
    validate_gate_config(&settings.gate)?;
    validate_reminder_config(&settings.reminders)?;
    validate_broadcast_config(&settings.broadcast)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(KapanBayarError::Config(
            "Bot token is required".to_string()
        ));
    }

    if config.owner_id == 0 {
        return Err(KapanBayarError::Config(
            "Owner ID must be configured".to_string()
        ));
    }

    Ok(())
}

/// Validate record store configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    match config.backend {
        StorageBackend::File => {
            if config.data_dir.is_empty() {
                return Err(KapanBayarError::Config(
                    "Data directory is required for the file backend".to_string()
                ));
            }
        }
        StorageBackend::Postgres => {
            if config.database_url.as_deref().map_or(true, str::is_empty) {
                return Err(KapanBayarError::Config(
                    "Database URL is required for the postgres backend".to_string()
                ));
            }

            if config.max_connections == 0 {
                return Err(KapanBayarError::Config(
                    "Max connections must be greater than 0".to_string()
                ));
            }

            if config.min_connections > config.max_connections {
                return Err(KapanBayarError::Config(
                    "Min connections cannot be greater than max connections".to_string()
                ));
            }
        }
        StorageBackend::Memory => {}
    }

    Ok(())
}

/// Validate gate configuration
fn validate_gate_config(config: &super::GateConfig) -> Result<()> {
    if config.cache_ttl_seconds == 0 {
        return Err(KapanBayarError::Config(
            "Join-status cache window must be greater than 0".to_string()
        ));
    }

    if config.check_timeout_seconds == 0 {
        return Err(KapanBayarError::Config(
            "Membership check timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate reminder configuration
fn validate_reminder_config(config: &super::ReminderConfig) -> Result<()> {
    if config.scan_period_seconds == 0 {
        return Err(KapanBayarError::Config(
            "Reminder scan period must be greater than 0".to_string()
        ));
    }

    if config.snooze_minutes == 0 {
        return Err(KapanBayarError::Config(
            "Snooze duration must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate broadcast configuration
fn validate_broadcast_config(config: &super::BroadcastConfig) -> Result<()> {
    if config.messages_per_second == 0 {
        return Err(KapanBayarError::Config(
            "Broadcast rate must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(KapanBayarError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(KapanBayarError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
