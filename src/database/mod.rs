//! Database module
//!
//! Record store backends and the factory that picks one from configuration

pub mod connection;
pub mod store;
pub mod file;
pub mod memory;
pub mod postgres;

use std::sync::Arc;
use tracing::info;
use crate::config::{StorageBackend, StorageConfig};
use crate::utils::errors::{KapanBayarError, Result};

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations};
pub use store::RecordStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Open the configured record store
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn RecordStore>> {
    match config.backend {
        StorageBackend::File => {
            info!(data_dir = %config.data_dir, "Using file record store");
            Ok(Arc::new(FileStore::open(&config.data_dir).await?))
        }
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_storage(config).ok_or_else(|| {
                KapanBayarError::Config("Database URL is required for the postgres backend".to_string())
            })?;

            info!("Connecting to database...");
            let pool = create_pool(&db_config).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PostgresStore::new(pool)))
        }
        StorageBackend::Memory => {
            info!("Using in-memory record store; nothing survives a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
