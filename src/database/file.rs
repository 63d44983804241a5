//! JSON file record store
//!
//! Layout under the data directory:
//! - `debts/<user_id>.json` one document per debt owner
//! - `users.json` the user registry
//! - `join_groups.json` the mandatory group list
//! - `join_users.json` join-status entries of all users

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use crate::models::{JoinStatus, MandatoryGroups, UserDebts, UserRegistry};
use crate::utils::errors::Result;
use super::store::RecordStore;

const DEBTS_DIR: &str = "debts";
const USERS_FILE: &str = "users.json";
const GROUPS_FILE: &str = "join_groups.json";
const JOIN_USERS_FILE: &str = "join_users.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct JoinUsersDocument {
    #[serde(default)]
    users: BTreeMap<i64, JoinStatus>,
}

#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    /// Serializes read-modify-write of the shared join-status file
    join_users_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(DEBTS_DIR)).await?;
        debug!(root = %root.display(), "File record store opened");

        Ok(Self {
            root,
            join_users_lock: Mutex::new(()),
        })
    }

    fn debts_path(&self, user_id: i64) -> PathBuf {
        self.root.join(DEBTS_DIR).join(format!("{}.json", user_id))
    }

    async fn read_json<T>(path: &Path) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the target
    async fn write_json<T>(path: &Path, value: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn load_user_debts(&self, user_id: i64) -> Result<UserDebts> {
        Ok(Self::read_json(&self.debts_path(user_id)).await?.unwrap_or_default())
    }

    async fn save_user_debts(&self, user_id: i64, debts: &UserDebts) -> Result<()> {
        Self::write_json(&self.debts_path(user_id), debts).await
    }

    async fn list_debt_owners(&self) -> Result<Vec<i64>> {
        let mut owners = Vec::new();
        let mut entries = fs::read_dir(self.root.join(DEBTS_DIR)).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match path.file_stem().and_then(|s| s.to_str()).map(str::parse::<i64>) {
                Some(Ok(user_id)) => owners.push(user_id),
                _ => warn!(path = %path.display(), "Ignoring debt file with a non-numeric name"),
            }
        }

        owners.sort_unstable();
        Ok(owners)
    }

    async fn load_join_status(&self, user_id: i64) -> Result<Option<JoinStatus>> {
        let doc: JoinUsersDocument = Self::read_json(&self.root.join(JOIN_USERS_FILE))
            .await?
            .unwrap_or_default();
        Ok(doc.users.get(&user_id).cloned())
    }

    async fn save_join_status(&self, user_id: i64, status: &JoinStatus) -> Result<()> {
        let _guard = self.join_users_lock.lock().await;
        let path = self.root.join(JOIN_USERS_FILE);

        let mut doc: JoinUsersDocument = Self::read_json(&path).await?.unwrap_or_default();
        doc.users.insert(user_id, status.clone());
        Self::write_json(&path, &doc).await
    }

    async fn load_all_join_status(&self) -> Result<BTreeMap<i64, JoinStatus>> {
        let doc: JoinUsersDocument = Self::read_json(&self.root.join(JOIN_USERS_FILE))
            .await?
            .unwrap_or_default();
        Ok(doc.users)
    }

    async fn list_mandatory_groups(&self) -> Result<MandatoryGroups> {
        Ok(Self::read_json(&self.root.join(GROUPS_FILE)).await?.unwrap_or_default())
    }

    async fn save_mandatory_groups(&self, groups: &MandatoryGroups) -> Result<()> {
        Self::write_json(&self.root.join(GROUPS_FILE), groups).await
    }

    async fn load_users(&self) -> Result<UserRegistry> {
        Ok(Self::read_json(&self.root.join(USERS_FILE)).await?.unwrap_or_default())
    }

    async fn save_users(&self, users: &UserRegistry) -> Result<()> {
        Self::write_json(&self.root.join(USERS_FILE), users).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::NewDebt;

    #[tokio::test]
    async fn test_missing_user_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        let debts = store.load_user_debts(7).await.unwrap();
        assert_eq!(debts, UserDebts::default());
        assert!(store.list_debt_owners().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_overwrites_and_lists_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        let mut debts = UserDebts::default();
        debts.push(NewDebt::parse("John | 100k").unwrap(), Utc::now());
        store.save_user_debts(7, &debts).await.unwrap();

        debts.remove(1);
        store.save_user_debts(7, &debts).await.unwrap();

        assert!(store.load_user_debts(7).await.unwrap().debts.is_empty());
        assert_eq!(store.list_debt_owners().await.unwrap(), vec![7]);
        assert!(!dir.path().join("debts").join("7.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_non_numeric_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.save_user_debts(3, &UserDebts::default()).await.unwrap();
        fs::write(dir.path().join("debts").join("notes.json"), b"{}").await.unwrap();
        fs::write(dir.path().join("debts").join("README"), b"x").await.unwrap();

        assert_eq!(store.list_debt_owners().await.unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_join_status_entries_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        let mut status = BTreeMap::new();
        status.insert("foo".to_string(), true);
        store.save_join_status(1, &JoinStatus::new(status.clone(), Utc::now())).await.unwrap();

        status.insert("foo".to_string(), false);
        store.save_join_status(2, &JoinStatus::new(status, Utc::now())).await.unwrap();

        assert!(store.load_join_status(1).await.unwrap().unwrap().has_joined("foo"));
        assert!(!store.load_join_status(2).await.unwrap().unwrap().has_joined("foo"));
        assert!(store.load_join_status(3).await.unwrap().is_none());
        assert_eq!(store.load_all_join_status().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        fs::write(dir.path().join("debts").join("9.json"), b"not json").await.unwrap();
        assert!(store.load_user_debts(9).await.is_err());
    }
}
