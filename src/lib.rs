//! KapanBayar Telegram Bot
//!
//! A Telegram bot that records informal debts and reminds the lender when
//! they come due. Access to the debt features is gated behind membership of
//! a configurable list of groups and channels.

#![allow(non_snake_case)]

pub mod config;
pub mod handlers;
pub mod services;
pub mod models;
pub mod database;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{KapanBayarError, Result};

// Re-export main components for easy access
pub use database::{open_store, RecordStore};
pub use services::ServiceFactory;
pub use state::StateStorage;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
