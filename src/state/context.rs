//! Conversation context management
//!
//! Tracks which multi-step prompt a user is answering, so the next plain text
//! message is routed to the right handler.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};

/// Prompt the user was last asked to answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    AddingDebt,
    DeletingDebt,
    SettingInterval,
    DeletingGroup,
}

/// User conversation context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    /// User ID this context belongs to
    pub user_id: i64,
    pub state: ConversationState,
    /// When this context expires
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(user_id: i64, state: ConversationState, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            state,
            expires_at: now + ttl,
            updated_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
