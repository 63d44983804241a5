//! Mandatory-group gate
//!
//! Decides whether a user may use gated features. Membership answers are
//! cached per user for a short window so the Bot API is not asked on every
//! message; a stale or missing entry triggers a full re-check of every
//! mandatory group, and the fresh entry replaces the old one wholesale.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMemberStatus, Recipient, UserId};
use tracing::{debug, info, warn};
use crate::database::RecordStore;
use crate::models::{JoinStatus, MembershipStatus};
use crate::utils::errors::{KapanBayarError, MembershipError, MembershipResult, Result};
use crate::utils::helpers::normalize_group_handle;
use crate::utils::logging::log_gate_decision;

/// Source of truth for group membership
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    async fn get_membership(&self, group: &str, user_id: i64) -> MembershipResult<MembershipStatus>;
}

/// Membership lookups through the Bot API `getChatMember` method
#[derive(Clone)]
pub struct TelegramMembershipOracle {
    bot: Bot,
    timeout: Duration,
}

impl TelegramMembershipOracle {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }

    fn recipient(group: &str) -> Recipient {
        match group.parse::<i64>() {
            Ok(id) => Recipient::Id(ChatId(id)),
            Err(_) => Recipient::ChannelUsername(format!("@{}", group)),
        }
    }
}

#[async_trait]
impl MembershipOracle for TelegramMembershipOracle {
    async fn get_membership(&self, group: &str, user_id: i64) -> MembershipResult<MembershipStatus> {
        let request = self
            .bot
            .get_chat_member(Self::recipient(group), UserId(user_id as u64))
            .send();

        let member = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(member)) => member,
            Ok(Err(e)) => return Err(MembershipError::RequestFailed(e.to_string())),
            Err(_) => return Err(MembershipError::Timeout(self.timeout.as_secs())),
        };

        Ok(match member.kind.status() {
            ChatMemberStatus::Member => MembershipStatus::Member,
            ChatMemberStatus::Administrator => MembershipStatus::Administrator,
            ChatMemberStatus::Owner => MembershipStatus::Owner,
            _ => MembershipStatus::Other,
        })
    }
}

/// Outcome of adding a mandatory group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupAdded {
    Added(String),
    AlreadyPresent(String),
}

/// Cached join counts per mandatory group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub checked_users: usize,
    pub per_group: Vec<(String, usize)>,
}

#[derive(Clone)]
pub struct GateService {
    store: Arc<dyn RecordStore>,
    oracle: Arc<dyn MembershipOracle>,
    cache_ttl: chrono::Duration,
}

impl GateService {
    pub fn new(store: Arc<dyn RecordStore>, oracle: Arc<dyn MembershipOracle>, cache_ttl: chrono::Duration) -> Self {
        Self {
            store,
            oracle,
            cache_ttl,
        }
    }

    /// Whether the user may use gated features right now
    pub async fn is_allowed(&self, user_id: i64) -> Result<bool> {
        self.is_allowed_at(user_id, Utc::now()).await
    }

    pub async fn is_allowed_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let groups = self.store.list_mandatory_groups().await?.groups;
        if groups.is_empty() {
            return Ok(true);
        }

        if let Some(entry) = self.store.load_join_status(user_id).await? {
            if entry.is_fresh(now, self.cache_ttl) {
                let allowed = entry.allows(&groups);
                log_gate_decision(user_id, allowed, true);
                return Ok(allowed);
            }
        }

        let allowed = self.refresh(user_id, &groups, now).await?;
        log_gate_decision(user_id, allowed, false);
        Ok(allowed)
    }

    /// Ignore the cache and ask the oracle again ("I've joined" button)
    pub async fn recheck(&self, user_id: i64) -> Result<bool> {
        let groups = self.store.list_mandatory_groups().await?.groups;
        if groups.is_empty() {
            return Ok(true);
        }

        let allowed = self.refresh(user_id, &groups, Utc::now()).await?;
        log_gate_decision(user_id, allowed, false);
        Ok(allowed)
    }

    /// Query every group in list order and overwrite the user's entry.
    ///
    /// No short-circuit: a failed group does not stop the remaining lookups,
    /// so the stored entry always covers the full list.
    async fn refresh(&self, user_id: i64, groups: &[String], now: DateTime<Utc>) -> Result<bool> {
        let mut status = BTreeMap::new();
        let mut allowed = true;

        for group in groups {
            let joined = match self.oracle.get_membership(group, user_id).await {
                Ok(membership) => membership.is_joined(),
                Err(e) => {
                    warn!(user_id = user_id, group = %group, error = %e, "Membership check failed, treating as not joined");
                    false
                }
            };

            debug!(user_id = user_id, group = %group, joined = joined, "Membership checked");
            allowed &= joined;
            status.insert(group.clone(), joined);
        }

        self.store
            .save_join_status(user_id, &JoinStatus::new(status, now))
            .await?;

        Ok(allowed)
    }

    /// Groups the user has not joined according to the cached entry
    pub async fn missing_groups(&self, user_id: i64) -> Result<Vec<String>> {
        let groups = self.store.list_mandatory_groups().await?.groups;
        let entry = self.store.load_join_status(user_id).await?;

        Ok(groups
            .into_iter()
            .filter(|group| !entry.as_ref().map_or(false, |e| e.has_joined(group)))
            .collect())
    }

    pub async fn add_group(&self, raw: &str) -> Result<GroupAdded> {
        let handle = normalize_group_handle(raw).ok_or_else(|| {
            KapanBayarError::InvalidInput(
                "Invalid group! Use @username, a t.me link or a chat id.".to_string(),
            )
        })?;

        let mut list = self.store.list_mandatory_groups().await?;
        if !list.add(handle.clone()) {
            return Ok(GroupAdded::AlreadyPresent(handle));
        }

        self.store.save_mandatory_groups(&list).await?;
        info!(group = %handle, "Mandatory group added");
        Ok(GroupAdded::Added(handle))
    }

    /// Remove by 1-based position as shown in the group list
    pub async fn remove_group(&self, position: usize) -> Result<String> {
        let mut list = self.store.list_mandatory_groups().await?;
        let removed = position
            .checked_sub(1)
            .and_then(|index| list.remove(index))
            .ok_or_else(|| {
                KapanBayarError::InvalidInput(format!("Group number {} does not exist!", position))
            })?;

        self.store.save_mandatory_groups(&list).await?;
        info!(group = %removed, "Mandatory group removed");
        Ok(removed)
    }

    pub async fn list_groups(&self) -> Result<Vec<String>> {
        Ok(self.store.list_mandatory_groups().await?.groups)
    }

    /// Every cached join-status entry, keyed by user id
    pub async fn all_join_status(&self) -> Result<BTreeMap<i64, JoinStatus>> {
        self.store.load_all_join_status().await
    }

    pub async fn join_stats(&self) -> Result<JoinStats> {
        let groups = self.store.list_mandatory_groups().await?.groups;
        let entries = self.store.load_all_join_status().await?;

        let per_group = groups
            .into_iter()
            .map(|group| {
                let joined = entries.values().filter(|e| e.has_joined(&group)).count();
                (group, joined)
            })
            .collect();

        Ok(JoinStats {
            checked_users: entries.len(),
            per_group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use assert_matches::assert_matches;
    use crate::database::MemoryStore;

    /// Oracle answering from a fixed table and counting calls
    #[derive(Default)]
    struct ScriptedOracle {
        answers: HashMap<String, MembershipStatus>,
        failing: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedOracle {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MembershipOracle for ScriptedOracle {
        async fn get_membership(&self, group: &str, _user_id: i64) -> MembershipResult<MembershipStatus> {
            self.calls.lock().unwrap().push(group.to_string());
            if self.failing.iter().any(|g| g == group) {
                return Err(MembershipError::RequestFailed("chat not found".to_string()));
            }
            Ok(self.answers.get(group).copied().unwrap_or(MembershipStatus::Other))
        }
    }

    fn gate(store: Arc<MemoryStore>, oracle: Arc<ScriptedOracle>) -> GateService {
        GateService::new(store, oracle, chrono::Duration::minutes(5))
    }

    #[tokio::test]
    async fn test_no_groups_allows_without_oracle() {
        let oracle = Arc::new(ScriptedOracle::default());
        let gate = gate(Arc::new(MemoryStore::new()), oracle.clone());

        assert!(gate.is_allowed(1).await.unwrap());
        assert!(oracle.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_short_circuit() {
        let oracle = Arc::new(ScriptedOracle {
            answers: HashMap::from([("b".to_string(), MembershipStatus::Member)]),
            failing: vec!["a".to_string()],
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::with_groups(["a", "b"]));
        let gate = gate(store.clone(), oracle.clone());

        assert!(!gate.is_allowed(1).await.unwrap());
        assert_eq!(oracle.calls(), vec!["a".to_string(), "b".to_string()]);

        let entry = store.load_join_status(1).await.unwrap().unwrap();
        assert!(!entry.has_joined("a"));
        assert!(entry.has_joined("b"));
    }

    #[tokio::test]
    async fn test_remove_group_bounds() {
        let gate = gate(
            Arc::new(MemoryStore::with_groups(["a", "b"])),
            Arc::new(ScriptedOracle::default()),
        );

        assert_matches!(gate.remove_group(0).await, Err(KapanBayarError::InvalidInput(_)));
        assert_matches!(gate.remove_group(3).await, Err(KapanBayarError::InvalidInput(_)));
        assert_eq!(gate.remove_group(1).await.unwrap(), "a");
        assert_eq!(gate.list_groups().await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_add_group_normalizes_and_dedupes() {
        let gate = gate(Arc::new(MemoryStore::new()), Arc::new(ScriptedOracle::default()));

        assert_eq!(gate.add_group("@FooChannel").await.unwrap(), GroupAdded::Added("foochannel".to_string()));
        assert_eq!(
            gate.add_group("https://t.me/foochannel").await.unwrap(),
            GroupAdded::AlreadyPresent("foochannel".to_string())
        );
        assert_matches!(gate.add_group("   ").await, Err(KapanBayarError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_join_stats_counts_cached_members() {
        let store = Arc::new(MemoryStore::with_groups(["a", "b"]));
        let now = Utc::now();
        store
            .save_join_status(1, &JoinStatus::new(BTreeMap::from([("a".to_string(), true), ("b".to_string(), true)]), now))
            .await
            .unwrap();
        store
            .save_join_status(2, &JoinStatus::new(BTreeMap::from([("a".to_string(), true)]), now))
            .await
            .unwrap();

        let gate = gate(store, Arc::new(ScriptedOracle::default()));
        let stats = gate.join_stats().await.unwrap();
        assert_eq!(stats.checked_users, 2);
        assert_eq!(stats.per_group, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
    }
}
