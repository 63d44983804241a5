//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the KapanBayar application.

use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{KapanBayarError, Result};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| KapanBayarError::Config(format!("Invalid log filter: {}", e)))?;

    let guard = match &config.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, "kapanbayar.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
                .try_init()
                .map_err(|e| KapanBayarError::Config(format!("Logging already initialized: {}", e)))?;

            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .try_init()
                .map_err(|e| KapanBayarError::Config(format!("Logging already initialized: {}", e)))?;

            None
        }
    };

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: i64, action: &str, details: Option<&str>) {
    info!(
        user_id = user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log gate decisions
pub fn log_gate_decision(user_id: i64, allowed: bool, from_cache: bool) {
    if allowed {
        debug!(user_id = user_id, from_cache = from_cache, "Gate check: access granted");
    } else {
        info!(user_id = user_id, from_cache = from_cache, "Gate check: access denied");
    }
}

/// Log owner actions
pub fn log_owner_action(owner_id: i64, action: &str, target: Option<&str>) {
    warn!(
        owner_id = owner_id,
        action = action,
        target = target,
        "Owner action performed"
    );
}
