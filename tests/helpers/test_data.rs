//! Test data and doubles

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use KapanBayar::database::{MemoryStore, RecordStore};
use KapanBayar::models::{DebtRecord, MembershipStatus, NewDebt, UserDebts};
use KapanBayar::services::{MembershipOracle, ReminderNotifier};
use KapanBayar::utils::errors::{KapanBayarError, MembershipError, MembershipResult, Result};
use KapanBayar::utils::helpers::{combine_due_moment, parse_due_date, parse_remind_time};

/// Local moment from the `YYYY/MM/DD` and `HH:MM` forms users type
pub fn at(date: &str, time: &str) -> NaiveDateTime {
    combine_due_moment(parse_due_date(date).unwrap(), parse_remind_time(time).unwrap())
}

/// Debt document built from input lines
pub fn debts_from(lines: &[&str]) -> UserDebts {
    let mut debts = UserDebts::default();
    for line in lines {
        debts.push(NewDebt::parse(line).unwrap(), Utc::now());
    }
    debts
}

/// Memory store holding one user's debts
pub async fn store_with_debts(user_id: i64, debts: &UserDebts) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.save_user_debts(user_id, debts).await.unwrap();
    store
}

/// Oracle answering from a fixed table and recording lookups
#[derive(Default)]
pub struct FakeOracle {
    pub answers: HashMap<String, MembershipStatus>,
    pub failing: Vec<String>,
    pub calls: Mutex<Vec<(String, i64)>>,
}

impl FakeOracle {
    pub fn joined(groups: &[&str]) -> Self {
        Self {
            answers: groups.iter().map(|g| (g.to_string(), MembershipStatus::Member)).collect(),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MembershipOracle for FakeOracle {
    async fn get_membership(&self, group: &str, user_id: i64) -> MembershipResult<MembershipStatus> {
        self.calls.lock().unwrap().push((group.to_string(), user_id));
        if self.failing.iter().any(|g| g == group) {
            return Err(MembershipError::RequestFailed("network down".to_string()));
        }
        Ok(self.answers.get(group).copied().unwrap_or(MembershipStatus::Other))
    }
}

/// Notifier recording deliveries, failing for blocked users
#[derive(Default)]
pub struct RecordingNotifier {
    pub delivered: Mutex<Vec<(i64, u32)>>,
    pub blocked_users: Vec<i64>,
}

impl RecordingNotifier {
    pub fn delivered(&self) -> Vec<(i64, u32)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderNotifier for RecordingNotifier {
    async fn notify(&self, user_id: i64, debt: &DebtRecord) -> Result<()> {
        if self.blocked_users.contains(&user_id) {
            return Err(KapanBayarError::Io(std::io::Error::other("blocked")));
        }
        self.delivered.lock().unwrap().push((user_id, debt.id));
        Ok(())
    }
}
