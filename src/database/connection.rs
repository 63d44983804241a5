//! Database connection management

use sqlx::{Pool, Postgres};
use std::time::Duration;
use crate::config::StorageConfig;
use crate::utils::errors::KapanBayarError;

pub type DatabasePool = Pool<Postgres>;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl DatabaseConfig {
    /// Pool settings for the postgres backend; `None` without a database url
    pub fn from_storage(storage: &StorageConfig) -> Option<Self> {
        let url = storage.database_url.clone()?;
        Some(Self {
            url,
            max_connections: storage.max_connections,
            min_connections: storage.min_connections,
            ..Self::default()
        })
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/kapanbayar".to_string(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

/// Create a new database connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, KapanBayarError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect(&config.url)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), KapanBayarError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.min_connections, 1);
        assert!(config.url.contains("postgresql://"));
    }

    #[test]
    fn test_from_storage_requires_url() {
        let mut settings = Settings::default();
        assert!(DatabaseConfig::from_storage(&settings.storage).is_none());

        settings.storage.database_url = Some("postgresql://db/kapanbayar".to_string());
        settings.storage.max_connections = 8;
        let config = DatabaseConfig::from_storage(&settings.storage).unwrap();
        assert_eq!(config.url, "postgresql://db/kapanbayar");
        assert_eq!(config.max_connections, 8);
    }
}
