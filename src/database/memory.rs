//! In-process record store for tests and throwaway runs

use std::collections::BTreeMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::models::{JoinStatus, MandatoryGroups, UserDebts, UserRegistry};
use crate::utils::errors::Result;
use super::store::RecordStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    debts: RwLock<BTreeMap<i64, UserDebts>>,
    join_status: RwLock<BTreeMap<i64, JoinStatus>>,
    groups: RwLock<MandatoryGroups>,
    users: RwLock<UserRegistry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a mandatory group list
    pub fn with_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = MandatoryGroups::default();
        for group in groups {
            list.add(group.into());
        }

        Self {
            groups: RwLock::new(list),
            ..Self::default()
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_user_debts(&self, user_id: i64) -> Result<UserDebts> {
        Ok(self.debts.read().await.get(&user_id).cloned().unwrap_or_default())
    }

    async fn save_user_debts(&self, user_id: i64, debts: &UserDebts) -> Result<()> {
        self.debts.write().await.insert(user_id, debts.clone());
        Ok(())
    }

    async fn list_debt_owners(&self) -> Result<Vec<i64>> {
        Ok(self.debts.read().await.keys().copied().collect())
    }

    async fn load_join_status(&self, user_id: i64) -> Result<Option<JoinStatus>> {
        Ok(self.join_status.read().await.get(&user_id).cloned())
    }

    async fn save_join_status(&self, user_id: i64, status: &JoinStatus) -> Result<()> {
        self.join_status.write().await.insert(user_id, status.clone());
        Ok(())
    }

    async fn load_all_join_status(&self) -> Result<BTreeMap<i64, JoinStatus>> {
        Ok(self.join_status.read().await.clone())
    }

    async fn list_mandatory_groups(&self) -> Result<MandatoryGroups> {
        Ok(self.groups.read().await.clone())
    }

    async fn save_mandatory_groups(&self, groups: &MandatoryGroups) -> Result<()> {
        *self.groups.write().await = groups.clone();
        Ok(())
    }

    async fn load_users(&self) -> Result<UserRegistry> {
        Ok(self.users.read().await.clone())
    }

    async fn save_users(&self, users: &UserRegistry) -> Result<()> {
        *self.users.write().await = users.clone();
        Ok(())
    }
}
