//! Reminder scanner
//!
//! One background task walks every stored debt document on a fixed period and
//! fires each debt whose due moment has arrived, at most once per calendar
//! day. Due moments and fire markers use the host's local clock.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use crate::database::RecordStore;
use crate::models::{DebtRecord, ReminderState};
use crate::utils::errors::Result;
use super::locks::UserLocks;

/// Delivers a fired reminder to its owner
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn notify(&self, user_id: i64, debt: &DebtRecord) -> Result<()>;
}

/// Counters of one scan tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub users_scanned: usize,
    pub users_skipped: usize,
    pub fired: usize,
    pub malformed: usize,
    pub failed_users: usize,
    pub dispatch_failures: usize,
}

/// Last known state of the background loop
#[derive(Debug, Clone, Default)]
pub struct ScanStatus {
    pub last_scan: Option<DateTime<Utc>>,
    pub last_report: Option<ScanReport>,
    pub total_scans: u64,
    pub total_fired: u64,
    pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct ReminderScanner {
    store: Arc<dyn RecordStore>,
    locks: UserLocks,
    notifier: Option<Arc<dyn ReminderNotifier>>,
}

impl ReminderScanner {
    /// `notifier` of `None` only records fire markers
    pub fn new(store: Arc<dyn RecordStore>, locks: UserLocks, notifier: Option<Arc<dyn ReminderNotifier>>) -> Self {
        Self { store, locks, notifier }
    }

    /// Run one pass over every debt owner at the local moment `now`
    pub async fn scan_once(&self, now: NaiveDateTime) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        for user_id in self.store.list_debt_owners().await? {
            if let Err(e) = self.scan_user(user_id, now, &mut report).await {
                warn!(user_id = user_id, error = %e, "Reminder scan failed for user");
                report.failed_users += 1;
            }
        }

        debug!(?report, "Reminder scan finished");
        Ok(report)
    }

    async fn scan_user(&self, user_id: i64, now: NaiveDateTime, report: &mut ScanReport) -> Result<()> {
        let fired = {
            let _guard = self.locks.acquire(user_id).await;

            let mut debts = self.store.load_user_debts(user_id).await?;
            if !debts.reminders_enabled() {
                report.users_skipped += 1;
                return Ok(());
            }
            report.users_scanned += 1;

            let mut fired = Vec::new();
            for debt in debts.debts.iter_mut() {
                match debt.reminder_state(now) {
                    Ok(ReminderState::DueUnfired) => {
                        debt.last_reminded = Some(now);
                        fired.push(debt.clone());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(user_id = user_id, debt_id = debt.id, error = %e, "Skipping debt with malformed reminder");
                        report.malformed += 1;
                    }
                }
            }

            if !fired.is_empty() {
                self.store.save_user_debts(user_id, &debts).await?;
            }
            fired
        };

        for debt in &fired {
            info!(user_id = user_id, debt_id = debt.id, "Reminder fired");
            report.fired += 1;

            if let Some(notifier) = &self.notifier {
                if let Err(e) = notifier.notify(user_id, debt).await {
                    warn!(user_id = user_id, debt_id = debt.id, error = %e, "Failed to deliver reminder");
                    report.dispatch_failures += 1;
                }
            }
        }

        Ok(())
    }
}

async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = sleep(duration) => false,
    }
}

/// Owner of the running scanner task
pub struct ReminderHandle {
    cancel: CancellationToken,
    status: watch::Receiver<ScanStatus>,
    task: JoinHandle<()>,
}

impl ReminderHandle {
    /// Start the loop; the first scan runs immediately
    pub fn spawn(scanner: ReminderScanner, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let (tx, status) = watch::channel(ScanStatus::default());
        let task = tokio::spawn(run_loop(scanner, period, cancel.clone(), tx));

        info!(period_secs = period.as_secs(), "Reminder scanner started");
        Self { cancel, status, task }
    }

    pub fn status(&self) -> ScanStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanStatus> {
        self.status.clone()
    }

    /// Stop sleeping and wait for an in-flight scan to finish
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Reminder scanner task ended abnormally");
        }
        info!("Reminder scanner stopped");
    }
}

async fn run_loop(
    scanner: ReminderScanner,
    period: Duration,
    cancel: CancellationToken,
    status: watch::Sender<ScanStatus>,
) {
    loop {
        let now = Local::now().naive_local();
        let result = scanner.scan_once(now).await;

        status.send_modify(|s| {
            s.last_scan = Some(Utc::now());
            s.total_scans += 1;
            match result {
                Ok(report) => {
                    s.total_fired += report.fired as u64;
                    s.last_report = Some(report);
                    s.last_error = None;
                }
                Err(ref e) => {
                    error!(error = %e, "Reminder scan failed");
                    s.last_error = Some(e.to_string());
                }
            }
        });

        if sleep_or_cancel(&cancel, period).await {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::NewDebt;
    use crate::utils::helpers::{combine_due_moment, parse_due_date, parse_remind_time};

    fn at(date: &str, time: &str) -> NaiveDateTime {
        combine_due_moment(parse_due_date(date).unwrap(), parse_remind_time(time).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_debt_does_not_block_others() {
        let store = Arc::new(MemoryStore::new());
        let mut debts = crate::models::UserDebts::default();
        debts.push(NewDebt::parse("a | 1 | 2025/12/20 | 09:00").unwrap(), Utc::now());
        debts.push(NewDebt::parse("b | 1 | 2025/12/20 | 09:00").unwrap(), Utc::now());
        debts.debts[0].remind_at = Some("9 o'clock".to_string());
        store.save_user_debts(1, &debts).await.unwrap();

        let scanner = ReminderScanner::new(store.clone(), UserLocks::new(), None);
        let report = scanner.scan_once(at("2025/12/20", "10:00")).await.unwrap();

        assert_eq!(report.malformed, 1);
        assert_eq!(report.fired, 1);
        let saved = store.load_user_debts(1).await.unwrap();
        assert!(saved.debts[0].last_reminded.is_none());
        assert_eq!(saved.debts[1].last_reminded, Some(at("2025/12/20", "10:00")));
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let scanner = ReminderScanner::new(Arc::new(MemoryStore::new()), UserLocks::new(), None);
        let handle = ReminderHandle::spawn(scanner, Duration::from_secs(3600));

        let mut updates = handle.subscribe();
        updates.changed().await.unwrap();
        assert_eq!(handle.status().total_scans, 1);

        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .unwrap();
    }
}
