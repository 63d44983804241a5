//! Mandatory group and join-status models

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};

/// Ordered list of groups a user must join; handles are stored normalized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MandatoryGroups {
    #[serde(default)]
    pub groups: Vec<String>,
}

impl MandatoryGroups {
    /// Append a normalized handle; duplicates are refused
    pub fn add(&mut self, handle: String) -> bool {
        if self.groups.contains(&handle) {
            return false;
        }
        self.groups.push(handle);
        true
    }

    /// Remove by zero-based position
    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index < self.groups.len() {
            Some(self.groups.remove(index))
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }
}

/// What the messaging platform reports about a user in a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Member,
    Administrator,
    Owner,
    Other,
}

impl MembershipStatus {
    pub fn is_joined(self) -> bool {
        matches!(
            self,
            MembershipStatus::Member | MembershipStatus::Administrator | MembershipStatus::Owner
        )
    }
}

/// Cached membership of one user across the mandatory groups.
///
/// A single `last_checked` covers the whole entry; it is replaced wholesale on
/// every re-check, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinStatus {
    #[serde(default)]
    pub groups_status: BTreeMap<String, bool>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl JoinStatus {
    pub fn new(groups_status: BTreeMap<String, bool>, last_checked: DateTime<Utc>) -> Self {
        Self {
            groups_status,
            last_checked: Some(last_checked),
        }
    }

    /// Fresh while `0 <= now - last_checked < ttl`. A timestamp from the future
    /// (clock moved backwards) counts as stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.last_checked {
            Some(checked) => {
                let age = now - checked;
                age >= Duration::zero() && age < ttl
            }
            None => false,
        }
    }

    /// AND over `groups`; a group missing from the entry counts as not joined
    pub fn allows(&self, groups: &[String]) -> bool {
        groups
            .iter()
            .all(|group| self.groups_status.get(group).copied().unwrap_or(false))
    }

    pub fn has_joined(&self, group: &str) -> bool {
        self.groups_status.get(group).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_add_refuses_duplicates() {
        let mut list = MandatoryGroups::default();
        assert!(list.add("foo".to_string()));
        assert!(!list.add("foo".to_string()));
        assert!(list.add("bar".to_string()));
        assert_eq!(list.groups, groups(&["foo", "bar"]));
    }

    #[test]
    fn test_remove_by_index() {
        let mut list = MandatoryGroups { groups: groups(&["a", "b", "c"]) };
        assert_eq!(list.remove(1), Some("b".to_string()));
        assert_eq!(list.remove(5), None);
        assert_eq!(list.groups, groups(&["a", "c"]));
    }

    #[test]
    fn test_freshness_window() {
        let now = Utc::now();
        let ttl = Duration::minutes(5);

        let entry = JoinStatus::new(BTreeMap::new(), now - Duration::minutes(4));
        assert!(entry.is_fresh(now, ttl));

        let entry = JoinStatus::new(BTreeMap::new(), now - Duration::minutes(5));
        assert!(!entry.is_fresh(now, ttl));

        let entry = JoinStatus::new(BTreeMap::new(), now - Duration::days(1) + Duration::minutes(1));
        assert!(!entry.is_fresh(now, ttl));

        let entry = JoinStatus::new(BTreeMap::new(), now + Duration::minutes(1));
        assert!(!entry.is_fresh(now, ttl));
    }

    #[test]
    fn test_allows_treats_missing_as_false() {
        let mut status = BTreeMap::new();
        status.insert("a".to_string(), true);
        let entry = JoinStatus::new(status, Utc::now());

        assert!(entry.allows(&groups(&["a"])));
        assert!(!entry.allows(&groups(&["a", "b"])));
        assert!(entry.allows(&[]));
    }

    #[test]
    fn test_membership_statuses() {
        assert!(MembershipStatus::Member.is_joined());
        assert!(MembershipStatus::Administrator.is_joined());
        assert!(MembershipStatus::Owner.is_joined());
        assert!(!MembershipStatus::Other.is_joined());
    }
}
