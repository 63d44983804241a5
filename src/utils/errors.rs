//! Error handling for KapanBayar
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for KapanBayar application
#[derive(Error, Debug)]
pub enum KapanBayarError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Membership check error: {0}")]
    Membership(#[from] MembershipError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Debt not found: user {user_id}, debt {debt_id}")]
    DebtNotFound { user_id: i64, debt_id: u32 },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Membership oracle specific errors
#[derive(Error, Debug)]
pub enum MembershipError {
    #[error("membership request timed out after {0}s")]
    Timeout(u64),

    #[error("membership request failed: {0}")]
    RequestFailed(String),
}

/// Result type alias for KapanBayar operations
pub type Result<T> = std::result::Result<T, KapanBayarError>;

/// Result type alias for membership lookups
pub type MembershipResult<T> = std::result::Result<T, MembershipError>;

impl KapanBayarError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            KapanBayarError::Database(_) => false,
            KapanBayarError::Migration(_) => false,
            KapanBayarError::Telegram(_) => true,
            KapanBayarError::Membership(_) => true,
            KapanBayarError::Config(_) => false,
            KapanBayarError::DebtNotFound { .. } => false,
            KapanBayarError::MalformedRecord(_) => false,
            KapanBayarError::Serialization(_) => false,
            KapanBayarError::Io(_) => true,
            KapanBayarError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            KapanBayarError::Database(_) => ErrorSeverity::Critical,
            KapanBayarError::Migration(_) => ErrorSeverity::Critical,
            KapanBayarError::Config(_) => ErrorSeverity::Critical,
            KapanBayarError::Membership(_) => ErrorSeverity::Warning,
            KapanBayarError::MalformedRecord(_) => ErrorSeverity::Warning,
            KapanBayarError::DebtNotFound { .. } => ErrorSeverity::Info,
            KapanBayarError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Text shown to the chat user when a handler fails with this error.
    ///
    /// Validation problems are echoed back; everything else collapses into a
    /// generic failure so storage details never leak into the chat.
    pub fn user_message(&self) -> String {
        match self {
            KapanBayarError::InvalidInput(reason) => format!("❌ {}", reason),
            KapanBayarError::DebtNotFound { debt_id, .. } => {
                format!("❌ Debt #{} was not found.", debt_id)
            }
            _ => "❌ Something went wrong. Please try again later.".to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_shown_to_user() {
        let err = KapanBayarError::InvalidInput("Wrong date format".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Info);
        assert!(err.user_message().contains("Wrong date format"));
    }

    #[test]
    fn test_io_error_is_generic_for_user() {
        let err = KapanBayarError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert!(err.is_recoverable());
        assert!(!err.user_message().contains("disk full"));
    }

    #[test]
    fn test_membership_error_conversion() {
        let err: KapanBayarError = MembershipError::Timeout(10).into();
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.to_string().contains("timed out"));
    }
}
