//! Record store contract
//!
//! Every backend exposes the same flat load/save surface: per-user debt
//! documents, per-user join-status entries, the mandatory group list and the
//! user registry. Saves are full overwrites.

use std::collections::BTreeMap;
use async_trait::async_trait;
use crate::models::{JoinStatus, MandatoryGroups, UserDebts, UserRegistry};
use crate::utils::errors::Result;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Debts of one user, or an empty default document when none exist
    async fn load_user_debts(&self, user_id: i64) -> Result<UserDebts>;

    async fn save_user_debts(&self, user_id: i64, debts: &UserDebts) -> Result<()>;

    /// Every user that has a stored debt document
    async fn list_debt_owners(&self) -> Result<Vec<i64>>;

    async fn load_join_status(&self, user_id: i64) -> Result<Option<JoinStatus>>;

    /// Replace the user's whole join-status entry
    async fn save_join_status(&self, user_id: i64, status: &JoinStatus) -> Result<()>;

    async fn load_all_join_status(&self) -> Result<BTreeMap<i64, JoinStatus>>;

    async fn list_mandatory_groups(&self) -> Result<MandatoryGroups>;

    async fn save_mandatory_groups(&self, groups: &MandatoryGroups) -> Result<()>;

    async fn load_users(&self) -> Result<UserRegistry>;

    async fn save_users(&self, users: &UserRegistry) -> Result<()>;
}
