//! User service implementation
//!
//! Keeps the registry of everyone who has talked to the bot. The registry is
//! one document, so updates are serialized by a service-wide lock.

use std::sync::Arc;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use crate::database::RecordStore;
use crate::models::UserRegistry;
use crate::utils::errors::Result;

/// User service for managing the registry
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn RecordStore>,
    write_lock: Arc<Mutex<()>>,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Register the user on first contact; returns true for a new user
    pub async fn register(&self, user_id: i64, username: Option<String>, first_name: String) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut registry = self.store.load_users().await?;
        if !registry.register(user_id, username, first_name, Utc::now()) {
            return Ok(false);
        }

        self.store.save_users(&registry).await?;
        info!(user_id = user_id, total = registry.len(), "New user registered");
        Ok(true)
    }

    /// Register if unknown, otherwise bump last-active
    pub async fn touch(&self, user_id: i64, username: Option<String>, first_name: String) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut registry = self.store.load_users().await?;
        let now = Utc::now();
        if !registry.touch(user_id, now) {
            registry.register(user_id, username, first_name, now);
            info!(user_id = user_id, "New user registered");
        }

        self.store.save_users(&registry).await?;
        debug!(user_id = user_id, "User activity recorded");
        Ok(())
    }

    pub async fn total_users(&self) -> Result<usize> {
        Ok(self.store.load_users().await?.len())
    }

    pub async fn all_user_ids(&self) -> Result<Vec<i64>> {
        Ok(self.store.load_users().await?.user_ids())
    }

    /// Full registry, used for the owner's backup export
    pub async fn registry(&self) -> Result<UserRegistry> {
        self.store.load_users().await
    }
}
