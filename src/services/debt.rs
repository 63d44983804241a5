//! Debt service implementation
//!
//! Entry points the chat handlers call to mutate a user's debt document.
//! Each operation runs under the user's lock as one load-modify-save.

use std::sync::Arc;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info, warn};
use crate::database::RecordStore;
use crate::models::{DebtRecord, NewDebt, UserDebts};
use crate::utils::errors::{KapanBayarError, Result};
use crate::utils::helpers::{DUE_DATE_FORMAT, REMIND_TIME_FORMAT};
use super::locks::UserLocks;

/// Aggregate over every stored debt document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtOverview {
    pub owners: usize,
    pub total_debts: usize,
    pub total_amount: f64,
}

#[derive(Clone)]
pub struct DebtService {
    store: Arc<dyn RecordStore>,
    locks: UserLocks,
    snooze: chrono::Duration,
}

impl DebtService {
    pub fn new(store: Arc<dyn RecordStore>, locks: UserLocks, snooze: chrono::Duration) -> Self {
        Self { store, locks, snooze }
    }

    /// Record a new debt; returns its id
    pub async fn add_debt(&self, user_id: i64, debt: NewDebt) -> Result<u32> {
        let _guard = self.locks.acquire(user_id).await;

        let mut debts = self.store.load_user_debts(user_id).await?;
        let id = debts.push(debt, Utc::now());
        self.store.save_user_debts(user_id, &debts).await?;

        info!(user_id = user_id, debt_id = id, "Debt added");
        Ok(id)
    }

    /// Delete a debt and renumber the rest; false if the id was unknown
    pub async fn delete_debt(&self, user_id: i64, debt_id: u32) -> Result<bool> {
        let _guard = self.locks.acquire(user_id).await;

        let mut debts = self.store.load_user_debts(user_id).await?;
        if !debts.remove(debt_id) {
            debug!(user_id = user_id, debt_id = debt_id, "Delete of unknown debt ignored");
            return Ok(false);
        }

        self.store.save_user_debts(user_id, &debts).await?;
        info!(user_id = user_id, debt_id = debt_id, "Debt deleted");
        Ok(true)
    }

    /// Delete a debt from a reminder's "Paid" button.
    ///
    /// The button carries the creation timestamp; ids shift after deletions,
    /// so a mismatch means the button points at a debt that no longer exists.
    pub async fn mark_paid(&self, user_id: i64, debt_id: u32, created_at: i64) -> Result<DebtRecord> {
        let _guard = self.locks.acquire(user_id).await;

        let mut debts = self.store.load_user_debts(user_id).await?;
        let record = debts
            .get(debt_id)
            .filter(|d| d.created_at.timestamp() == created_at)
            .cloned()
            .ok_or(KapanBayarError::DebtNotFound { user_id, debt_id })?;

        debts.remove(debt_id);
        self.store.save_user_debts(user_id, &debts).await?;

        info!(user_id = user_id, debt_id = debt_id, "Debt marked as paid");
        Ok(record)
    }

    /// Push the debt's due moment to `now` plus the snooze window and clear
    /// the fire marker, so it fires again once the window has passed.
    ///
    /// Guarded by the creation timestamp like `mark_paid`.
    pub async fn snooze(
        &self,
        user_id: i64,
        debt_id: u32,
        created_at: i64,
        now: NaiveDateTime,
    ) -> Result<NaiveDateTime> {
        let _guard = self.locks.acquire(user_id).await;

        let mut debts = self.store.load_user_debts(user_id).await?;
        let due = now + self.snooze;
        let record = debts
            .get_mut(debt_id)
            .filter(|d| d.created_at.timestamp() == created_at)
            .ok_or(KapanBayarError::DebtNotFound { user_id, debt_id })?;

        record.due_date = Some(due.format(DUE_DATE_FORMAT).to_string());
        record.remind_at = Some(due.format(REMIND_TIME_FORMAT).to_string());
        record.last_reminded = None;

        self.store.save_user_debts(user_id, &debts).await?;
        info!(user_id = user_id, debt_id = debt_id, due = %due, "Debt reminder snoozed");
        Ok(due)
    }

    pub async fn list_debts(&self, user_id: i64) -> Result<UserDebts> {
        self.store.load_user_debts(user_id).await
    }

    pub async fn get_debt(&self, user_id: i64, debt_id: u32) -> Result<DebtRecord> {
        self.store
            .load_user_debts(user_id)
            .await?
            .get(debt_id)
            .cloned()
            .ok_or(KapanBayarError::DebtNotFound { user_id, debt_id })
    }

    pub async fn total_amount(&self, user_id: i64) -> Result<f64> {
        Ok(self.store.load_user_debts(user_id).await?.total_amount())
    }

    /// Totals across all users; unreadable documents are skipped
    pub async fn overview(&self) -> Result<DebtOverview> {
        let mut overview = DebtOverview::default();

        for user_id in self.store.list_debt_owners().await? {
            match self.store.load_user_debts(user_id).await {
                Ok(debts) => {
                    overview.owners += 1;
                    overview.total_debts += debts.debts.len();
                    overview.total_amount += debts.total_amount();
                }
                Err(e) => warn!(user_id = user_id, error = %e, "Skipping unreadable debt document"),
            }
        }

        Ok(overview)
    }

    pub async fn set_paused(&self, user_id: i64, paused: bool) -> Result<()> {
        let _guard = self.locks.acquire(user_id).await;

        let mut debts = self.store.load_user_debts(user_id).await?;
        debts.is_notification_paused = paused;
        self.store.save_user_debts(user_id, &debts).await?;

        info!(user_id = user_id, paused = paused, "Reminder pause flag changed");
        Ok(())
    }

    /// Set the reminder interval in minutes; 0 disables reminders
    pub async fn set_interval(&self, user_id: i64, minutes: i64) -> Result<u32> {
        let minutes = u32::try_from(minutes).map_err(|_| {
            KapanBayarError::InvalidInput("Interval must be 0 or a positive number of minutes!".to_string())
        })?;

        let _guard = self.locks.acquire(user_id).await;

        let mut debts = self.store.load_user_debts(user_id).await?;
        debts.notification_interval = minutes;
        self.store.save_user_debts(user_id, &debts).await?;

        info!(user_id = user_id, interval = minutes, "Reminder interval changed");
        Ok(minutes)
    }

    /// Parse interval text typed by the user
    pub fn parse_interval(raw: &str) -> Result<i64> {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| KapanBayarError::InvalidInput("Enter a number!".to_string()))
    }

    /// Creation timestamp carried in "Paid" buttons
    pub fn paid_token(created_at: DateTime<Utc>) -> i64 {
        created_at.timestamp()
    }
}
