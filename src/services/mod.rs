//! Services module
//!
//! This module contains business logic services

pub mod debt;
pub mod gate;
pub mod locks;
pub mod notification;
pub mod reminder;
pub mod user;

// Re-export commonly used services
pub use debt::{DebtService, DebtOverview};
pub use gate::{GateService, GroupAdded, JoinStats, MembershipOracle, TelegramMembershipOracle};
pub use locks::UserLocks;
pub use notification::{BroadcastService, BroadcastReport, TelegramReminderNotifier};
pub use reminder::{ReminderHandle, ReminderNotifier, ReminderScanner, ScanReport, ScanStatus};
pub use user::UserService;

use std::sync::Arc;
use teloxide::Bot;
use crate::config::settings::Settings;
use crate::database::RecordStore;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub debt_service: DebtService,
    pub gate_service: GateService,
    pub user_service: UserService,
    pub broadcast_service: BroadcastService,
    locks: UserLocks,
    store: Arc<dyn RecordStore>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(
        bot: Bot,
        settings: &Settings,
        store: Arc<dyn RecordStore>,
        oracle: Arc<dyn MembershipOracle>,
    ) -> Self {
        let locks = UserLocks::new();
        let debt_service = DebtService::new(store.clone(), locks.clone(), settings.reminders.snooze());
        let gate_service = GateService::new(store.clone(), oracle, settings.gate.cache_ttl());
        let user_service = UserService::new(store.clone());
        let broadcast_service = BroadcastService::new(
            bot,
            user_service.clone(),
            settings.broadcast.messages_per_second,
        );

        Self {
            debt_service,
            gate_service,
            user_service,
            broadcast_service,
            locks,
            store,
        }
    }

    /// Scanner sharing the debt service's per-user locks
    pub fn reminder_scanner(&self, notifier: Option<Arc<dyn ReminderNotifier>>) -> ReminderScanner {
        ReminderScanner::new(self.store.clone(), self.locks.clone(), notifier)
    }
}
