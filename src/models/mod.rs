//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod debt;
pub mod user;
pub mod group;
pub mod callback;

// Re-export commonly used models
pub use debt::{DebtRecord, UserDebts, NewDebt, ReminderState, DEFAULT_INTERVAL_MINUTES};
pub use user::{RegisteredUser, UserRegistry};
pub use group::{MandatoryGroups, MembershipStatus, JoinStatus};
pub use callback::CallbackAction;
