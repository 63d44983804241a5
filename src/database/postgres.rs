//! Postgres record store
//!
//! Documents live in a single `records` table keyed by (kind, key) with a
//! JSONB payload, so the flat load/save contract maps onto one upsert.

use std::collections::BTreeMap;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::types::Json;
use tracing::debug;
use crate::models::{JoinStatus, MandatoryGroups, UserDebts, UserRegistry};
use crate::utils::errors::Result;
use super::connection::DatabasePool;
use super::store::RecordStore;

/// Record kinds stored in the `kind` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Debts,
    JoinStatus,
    Groups,
    Users,
}

impl RecordKind {
    fn as_str(self) -> &'static str {
        match self {
            RecordKind::Debts => "debts",
            RecordKind::JoinStatus => "join_status",
            RecordKind::Groups => "groups",
            RecordKind::Users => "users",
        }
    }
}

/// Key used for singleton documents (group list, user registry)
const GLOBAL_KEY: i64 = 0;

#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: DatabasePool,
}

impl PostgresStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn fetch<T>(&self, kind: RecordKind, key: i64) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin + 'static,
    {
        let row: Option<Json<T>> = sqlx::query_scalar(
            "SELECT data FROM records WHERE kind = $1 AND key = $2"
        )
        .bind(kind.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(value)| value))
    }

    async fn upsert<T>(&self, kind: RecordKind, key: i64, value: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        sqlx::query(
            r#"
            INSERT INTO records (kind, key, data, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (kind, key)
            DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(kind.as_str())
        .bind(key)
        .bind(Json(value))
        .execute(&self.pool)
        .await?;

        debug!(kind = kind.as_str(), key = key, "Record saved");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn load_user_debts(&self, user_id: i64) -> Result<UserDebts> {
        Ok(self.fetch(RecordKind::Debts, user_id).await?.unwrap_or_default())
    }

    async fn save_user_debts(&self, user_id: i64, debts: &UserDebts) -> Result<()> {
        self.upsert(RecordKind::Debts, user_id, debts).await
    }

    async fn list_debt_owners(&self) -> Result<Vec<i64>> {
        let owners: Vec<i64> = sqlx::query_scalar(
            "SELECT key FROM records WHERE kind = $1 ORDER BY key"
        )
        .bind(RecordKind::Debts.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(owners)
    }

    async fn load_join_status(&self, user_id: i64) -> Result<Option<JoinStatus>> {
        self.fetch(RecordKind::JoinStatus, user_id).await
    }

    async fn save_join_status(&self, user_id: i64, status: &JoinStatus) -> Result<()> {
        self.upsert(RecordKind::JoinStatus, user_id, status).await
    }

    async fn load_all_join_status(&self) -> Result<BTreeMap<i64, JoinStatus>> {
        let rows: Vec<(i64, Json<JoinStatus>)> = sqlx::query_as(
            "SELECT key, data FROM records WHERE kind = $1"
        )
        .bind(RecordKind::JoinStatus.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(key, Json(status))| (key, status)).collect())
    }

    async fn list_mandatory_groups(&self) -> Result<MandatoryGroups> {
        Ok(self.fetch(RecordKind::Groups, GLOBAL_KEY).await?.unwrap_or_default())
    }

    async fn save_mandatory_groups(&self, groups: &MandatoryGroups) -> Result<()> {
        self.upsert(RecordKind::Groups, GLOBAL_KEY, groups).await
    }

    async fn load_users(&self) -> Result<UserRegistry> {
        Ok(self.fetch(RecordKind::Users, GLOBAL_KEY).await?.unwrap_or_default())
    }

    async fn save_users(&self, users: &UserRegistry) -> Result<()> {
        self.upsert(RecordKind::Users, GLOBAL_KEY, users).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kinds_are_distinct() {
        let kinds = [RecordKind::Debts, RecordKind::JoinStatus, RecordKind::Groups, RecordKind::Users];
        let mut names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), kinds.len());
    }
}
