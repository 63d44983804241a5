//! User registry model

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub username: Option<String>,
    pub first_name: String,
    pub joined_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// Every user who ever contacted the bot, keyed by Telegram user id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRegistry {
    #[serde(default)]
    pub users: BTreeMap<i64, RegisteredUser>,
}

impl UserRegistry {
    /// Insert a user on first contact; returns false if already known
    pub fn register(&mut self, user_id: i64, username: Option<String>, first_name: String, now: DateTime<Utc>) -> bool {
        if self.users.contains_key(&user_id) {
            return false;
        }

        self.users.insert(user_id, RegisteredUser {
            username,
            first_name,
            joined_at: now,
            last_active: now,
        });
        true
    }

    /// Update last-active; unknown users are left alone
    pub fn touch(&mut self, user_id: i64, now: DateTime<Utc>) -> bool {
        match self.users.get_mut(&user_id) {
            Some(user) => {
                user.last_active = now;
                true
            }
            None => false,
        }
    }

    pub fn user_ids(&self) -> Vec<i64> {
        self.users.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
