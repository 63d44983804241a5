//! Notification service implementation
//!
//! Outbound messages that are not replies to a user action: reminder
//! delivery from the scanner and the owner's broadcast fan-out.

use std::num::NonZeroU32;
use std::sync::Arc;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::utils::html;
use tracing::{debug, info, warn};
use crate::models::{CallbackAction, DebtRecord};
use crate::utils::errors::Result;
use super::reminder::ReminderNotifier;
use super::user::UserService;

/// Reminder text shown when a debt becomes due
pub fn reminder_text(debt: &DebtRecord) -> String {
    let due = match (&debt.due_date, &debt.remind_at) {
        (Some(date), Some(time)) => format!("{} {}", date, time),
        (Some(date), None) => date.clone(),
        _ => "not set".to_string(),
    };
    let note = if debt.note.is_empty() { "-" } else { debt.note.as_str() };

    format!(
        "🔔 {}\n\n👤 <b>Name:</b> {}\n💰 <b>Amount:</b> {}\n📅 <b>Due:</b> {}\n📝 <b>Note:</b> {}",
        html::bold("Debt reminder!"),
        html::escape(&debt.debtor_name),
        html::escape(&debt.amount),
        html::escape(&due),
        html::escape(note),
    )
}

/// "Paid" / "Snooze" buttons attached to a reminder
pub fn reminder_keyboard(debt: &DebtRecord) -> InlineKeyboardMarkup {
    let paid = CallbackAction::Paid {
        debt_id: debt.id,
        created_at: debt.created_at.timestamp(),
    };
    let snooze = CallbackAction::Snooze {
        debt_id: debt.id,
        created_at: debt.created_at.timestamp(),
    };

    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Paid", paid.to_string()),
        InlineKeyboardButton::callback("⏸️ Snooze", snooze.to_string()),
    ]])
}

/// Sends fired reminders to the debt owner's private chat
#[derive(Clone)]
pub struct TelegramReminderNotifier {
    bot: Bot,
}

impl TelegramReminderNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReminderNotifier for TelegramReminderNotifier {
    async fn notify(&self, user_id: i64, debt: &DebtRecord) -> Result<()> {
        self.bot
            .send_message(ChatId(user_id), reminder_text(debt))
            .parse_mode(ParseMode::Html)
            .reply_markup(reminder_keyboard(debt))
            .await?;

        debug!(user_id = user_id, debt_id = debt.id, "Reminder delivered");
        Ok(())
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
}

/// Copies one message to every registered user, paced to the configured rate
#[derive(Clone)]
pub struct BroadcastService {
    bot: Bot,
    users: UserService,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl BroadcastService {
    pub fn new(bot: Bot, users: UserService, messages_per_second: u32) -> Self {
        let rate = NonZeroU32::new(messages_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            bot,
            users,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
        }
    }

    pub async fn broadcast(&self, from_chat: ChatId, message_id: MessageId) -> Result<BroadcastReport> {
        let recipients = self.users.all_user_ids().await?;
        let mut report = BroadcastReport {
            total: recipients.len(),
            ..BroadcastReport::default()
        };

        info!(total = report.total, "Starting broadcast");

        for user_id in recipients {
            self.limiter.until_ready().await;

            match self.bot.copy_message(ChatId(user_id), from_chat, message_id).await {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    warn!(user_id = user_id, error = %e, "Broadcast delivery failed");
                    report.failed += 1;
                }
            }
        }

        info!(sent = report.sent, failed = report.failed, total = report.total, "Broadcast completed");
        Ok(report)
    }
}
