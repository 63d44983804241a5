//! State storage implementation
//!
//! Conversation contexts live in process memory only; a restart simply drops
//! every half-finished prompt. Expired entries are removed on access and by
//! `cleanup_expired`.

use std::collections::HashMap;
use std::sync::Arc;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use super::context::{ConversationContext, ConversationState};

/// How long a prompt waits for its answer
pub const DEFAULT_CONTEXT_TTL_MINUTES: i64 = 10;

#[derive(Clone, Debug)]
pub struct StateStorage {
    contexts: Arc<RwLock<HashMap<i64, ConversationContext>>>,
    ttl: Duration,
}

impl Default for StateStorage {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_CONTEXT_TTL_MINUTES))
    }
}

impl StateStorage {
    pub fn new(ttl: Duration) -> Self {
        Self {
            contexts: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Put the user into `state`, replacing any previous prompt
    pub async fn set_state(&self, user_id: i64, state: ConversationState) {
        let context = ConversationContext::new(user_id, state, self.ttl, Utc::now());
        debug!(user_id = user_id, state = ?state, "Conversation state set");
        self.contexts.write().await.insert(user_id, context);
    }

    /// Current state, `None` when absent or expired
    pub async fn current_state(&self, user_id: i64) -> Option<ConversationState> {
        let now = Utc::now();
        let context = self.contexts.read().await.get(&user_id).cloned()?;

        if context.is_expired_at(now) {
            debug!(user_id = user_id, state = ?context.state, "Conversation state expired");
            self.contexts.write().await.remove(&user_id);
            return None;
        }

        Some(context.state)
    }

    /// Take the current state and clear it
    pub async fn take_state(&self, user_id: i64) -> Option<ConversationState> {
        let state = self.current_state(user_id).await;
        self.clear_state(user_id).await;
        state
    }

    pub async fn clear_state(&self, user_id: i64) {
        self.contexts.write().await.remove(&user_id);
    }

    /// Drop every expired context; returns how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut contexts = self.contexts.write().await;
        let before = contexts.len();
        contexts.retain(|_, context| !context.is_expired_at(now));
        before - contexts.len()
    }
}
