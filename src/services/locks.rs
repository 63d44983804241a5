//! Per-user mutual exclusion
//!
//! Every load-modify-save of a user's debt document goes through the user's
//! lock, whether it comes from a chat command or from a reminder fire.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default, Debug)]
pub struct UserLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and hold the lock of one user
    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().await;
            // Entries only the map references are neither held nor awaited
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Users with a lock entry currently in the map
    pub async fn tracked_users(&self) -> usize {
        self.inner.lock().await.len()
    }
}
