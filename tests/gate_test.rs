//! Mandatory-group gate tests
//!
//! Cache behaviour runs against an in-process oracle; the Bot API oracle runs
//! against a wiremock server.

mod helpers;

use std::sync::Arc;
use std::time::Duration;
use assert_matches::assert_matches;
use chrono::Utc;
use serde_json::json;
use serial_test::serial;
use KapanBayar::database::{MemoryStore, RecordStore};
use KapanBayar::models::MembershipStatus;
use KapanBayar::services::{GateService, GroupAdded, MembershipOracle, TelegramMembershipOracle};
use KapanBayar::utils::errors::{KapanBayarError, MembershipError};
use helpers::*;

const USER: i64 = 42;

fn gate(store: Arc<MemoryStore>, oracle: Arc<FakeOracle>) -> GateService {
    GateService::new(store, oracle, chrono::Duration::minutes(5))
}

#[tokio::test]
async fn test_no_groups_allows_without_lookups() {
    let oracle = Arc::new(FakeOracle::default());
    let service = gate(Arc::new(MemoryStore::new()), oracle.clone());

    assert!(service.is_allowed(USER).await.unwrap());
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_fresh_entry_is_served_from_cache() {
    let store = Arc::new(MemoryStore::with_groups(["foo", "bar"]));
    let oracle = Arc::new(FakeOracle::joined(&["foo", "bar"]));
    let service = gate(store.clone(), oracle.clone());
    let now = Utc::now();

    assert!(service.is_allowed_at(USER, now).await.unwrap());
    assert_eq!(oracle.call_count(), 2);

    assert!(service.is_allowed_at(USER, now + chrono::Duration::minutes(4)).await.unwrap());
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_stale_entry_is_rechecked_and_replaced() {
    let store = Arc::new(MemoryStore::with_groups(["foo"]));
    let oracle = Arc::new(FakeOracle::joined(&["foo"]));
    let service = gate(store.clone(), oracle.clone());
    let now = Utc::now();

    service.is_allowed_at(USER, now).await.unwrap();
    let later = now + chrono::Duration::minutes(5);
    service.is_allowed_at(USER, later).await.unwrap();

    assert_eq!(oracle.call_count(), 2);
    let entry = store.load_join_status(USER).await.unwrap().unwrap();
    assert_eq!(entry.last_checked, Some(later));
}

#[tokio::test]
async fn test_future_timestamp_counts_as_stale() {
    let store = Arc::new(MemoryStore::with_groups(["foo"]));
    let oracle = Arc::new(FakeOracle::joined(&["foo"]));
    let service = gate(store, oracle.clone());
    let now = Utc::now();

    service.is_allowed_at(USER, now).await.unwrap();
    service.is_allowed_at(USER, now - chrono::Duration::minutes(1)).await.unwrap();
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_failed_lookup_denies_but_checks_every_group() {
    let store = Arc::new(MemoryStore::with_groups(["foo", "bar", "baz"]));
    let oracle = Arc::new(FakeOracle {
        failing: vec!["foo".to_string()],
        ..FakeOracle::joined(&["bar", "baz"])
    });
    let service = gate(store.clone(), oracle.clone());

    assert!(!service.is_allowed(USER).await.unwrap());

    let asked: Vec<String> = oracle.calls.lock().unwrap().iter().map(|(g, _)| g.clone()).collect();
    assert_eq!(asked, vec!["foo", "bar", "baz"]);

    let entry = store.load_join_status(USER).await.unwrap().unwrap();
    assert_eq!(entry.groups_status.get("foo"), Some(&false));
    assert_eq!(entry.groups_status.get("baz"), Some(&true));
    assert_eq!(service.missing_groups(USER).await.unwrap(), vec!["foo".to_string()]);
}

#[tokio::test]
async fn test_recheck_ignores_fresh_cache() {
    let store = Arc::new(MemoryStore::with_groups(["foo"]));
    let oracle = Arc::new(FakeOracle::default());
    let service = gate(store, oracle.clone());

    assert!(!service.is_allowed(USER).await.unwrap());
    assert!(!service.recheck(USER).await.unwrap());
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_removed_group_no_longer_required() {
    let store = Arc::new(MemoryStore::with_groups(["foo", "bar"]));
    let oracle = Arc::new(FakeOracle::joined(&["foo"]));
    let service = gate(store, oracle);

    assert!(!service.is_allowed(USER).await.unwrap());
    assert_eq!(service.remove_group(2).await.unwrap(), "bar");
    assert!(service.is_allowed(USER).await.unwrap());
}

#[tokio::test]
async fn test_group_admin_operations() {
    let service = gate(Arc::new(MemoryStore::new()), Arc::new(FakeOracle::default()));

    assert_eq!(
        service.add_group("https://t.me/foo").await.unwrap(),
        GroupAdded::Added("foo".to_string())
    );
    assert_eq!(
        service.add_group("@foo").await.unwrap(),
        GroupAdded::AlreadyPresent("foo".to_string())
    );
    assert_matches!(service.add_group("   ").await, Err(KapanBayarError::InvalidInput(_)));
    assert_matches!(service.remove_group(0).await, Err(KapanBayarError::InvalidInput(_)));
    assert_matches!(service.remove_group(2).await, Err(KapanBayarError::InvalidInput(_)));
    assert_eq!(service.list_groups().await.unwrap(), vec!["foo".to_string()]);
}

#[tokio::test]
async fn test_join_stats_counts_cached_entries() {
    let store = Arc::new(MemoryStore::with_groups(["foo", "bar"]));
    let oracle = Arc::new(FakeOracle::joined(&["foo"]));
    let service = gate(store, oracle);

    service.is_allowed(1).await.unwrap();
    service.is_allowed(2).await.unwrap();

    let stats = service.join_stats().await.unwrap();
    assert_eq!(stats.checked_users, 2);
    assert_eq!(stats.per_group, vec![("foo".to_string(), 2), ("bar".to_string(), 0)]);
}

#[tokio::test]
#[serial]
async fn test_bot_api_oracle_reads_member_status() {
    let mock = TelegramMockServer::new().await;
    mock.mock_chat_member(json!("@foo"), USER, "member").await;
    mock.mock_chat_member(json!(-1001234567890_i64), USER, "left").await;

    let oracle = TelegramMembershipOracle::new(mock.bot(), Duration::from_secs(5));

    assert_eq!(oracle.get_membership("foo", USER).await.unwrap(), MembershipStatus::Member);
    assert_eq!(
        oracle.get_membership("-1001234567890", USER).await.unwrap(),
        MembershipStatus::Other
    );
}

#[tokio::test]
#[serial]
async fn test_bot_api_error_counts_as_not_joined() {
    let mock = TelegramMockServer::new().await;
    mock.mock_chat_member_error(json!("@hidden")).await;
    mock.mock_chat_member(json!("@foo"), USER, "member").await;

    let oracle = Arc::new(TelegramMembershipOracle::new(mock.bot(), Duration::from_secs(5)));
    assert_matches!(
        oracle.get_membership("hidden", USER).await,
        Err(MembershipError::RequestFailed(_))
    );

    let store = Arc::new(MemoryStore::with_groups(["hidden", "foo"]));
    let service = GateService::new(store, oracle, chrono::Duration::minutes(5));
    assert!(!service.is_allowed(USER).await.unwrap());
    assert_eq!(mock.requests_to("getChatMember").await.len(), 3);
}

#[tokio::test]
#[serial]
async fn test_bot_api_lookup_times_out() {
    let mock = TelegramMockServer::new().await;
    mock.mock_chat_member_slow(Duration::from_secs(2)).await;

    let oracle = TelegramMembershipOracle::new(mock.bot(), Duration::from_millis(200));
    assert_matches!(
        oracle.get_membership("foo", USER).await,
        Err(MembershipError::Timeout(_))
    );
}
