//! Callback query handlers module
//!
//! This module contains handlers for all inline keyboard button callbacks

use chrono::Local;
use teloxide::{Bot, types::{CallbackQuery, ChatId, MessageId, ParseMode}, prelude::*};
use teloxide::utils::html;
use tracing::{debug, info, warn};
use crate::handlers::group_list_text;
use crate::handlers::keyboards::{join_keyboard, main_menu_keyboard};
use crate::models::CallbackAction;
use crate::services::ServiceFactory;
use crate::utils::errors::{KapanBayarError, Result};

/// Main callback query dispatcher
pub async fn handle_callback_query(bot: Bot, query: CallbackQuery, services: ServiceFactory) -> Result<()> {
    let user_id = query.from.id.0 as i64;

    // Answer the callback query first to remove loading state
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, callback_id = %query.id, "Failed to answer callback query");
    }

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };

    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            warn!(user_id = user_id, error = %e, "Ignoring unknown callback");
            return Ok(());
        }
    };

    let Some(message) = query.message.as_ref() else {
        debug!(user_id = user_id, "Callback without a message, nothing to edit");
        return Ok(());
    };
    let target = (message.chat().id, message.id());

    debug!(user_id = user_id, action = ?action, "Routing callback");
    match action {
        CallbackAction::CheckJoin => handle_check_join(&bot, target, user_id, &services).await,
        CallbackAction::Paid { debt_id, created_at } => {
            handle_paid(&bot, target, user_id, debt_id, created_at, &services).await
        }
        CallbackAction::Snooze { debt_id, created_at } => {
            handle_snooze(&bot, target, user_id, debt_id, created_at, &services).await
        }
    }
}

/// "I've joined": force a fresh membership check
async fn handle_check_join(
    bot: &Bot,
    (chat_id, message_id): (ChatId, MessageId),
    user_id: i64,
    services: &ServiceFactory,
) -> Result<()> {
    if services.gate_service.recheck(user_id).await? {
        info!(user_id = user_id, "Join verified");
        bot.edit_message_text(
            chat_id,
            message_id,
            "✅ <b>Verified!</b>\n\nYou have joined every required group and can now use the bot.",
        )
        .parse_mode(ParseMode::Html)
        .await?;

        bot.send_message(chat_id, "🎉 Choose an option from the menu below:")
            .reply_markup(main_menu_keyboard())
            .await?;
        return Ok(());
    }

    let missing = services.gate_service.missing_groups(user_id).await?;
    let groups = services.gate_service.list_groups().await?;
    bot.edit_message_text(
        chat_id,
        message_id,
        format!(
            "❌ <b>You have not joined every group yet!</b>\n\nStill missing:\n{}\n\n\
             Join them, then press <b>I've joined</b> again.",
            group_list_text(&missing)
        ),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(join_keyboard(&groups))
    .await?;
    Ok(())
}

/// Reminder "Paid": delete the debt the button was issued for
async fn handle_paid(
    bot: &Bot,
    (chat_id, message_id): (ChatId, MessageId),
    user_id: i64,
    debt_id: u32,
    created_at: i64,
    services: &ServiceFactory,
) -> Result<()> {
    let text = match services.debt_service.mark_paid(user_id, debt_id, created_at).await {
        Ok(debt) => format!(
            "✅ <b>{}</b> marked as paid ({}).\nThe debt was removed from your list.",
            html::escape(&debt.debtor_name),
            html::escape(&debt.amount)
        ),
        Err(KapanBayarError::DebtNotFound { .. }) => {
            "❌ This debt no longer exists or was already changed.".to_string()
        }
        Err(e) => return Err(e),
    };

    bot.edit_message_text(chat_id, message_id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Reminder "Snooze": push the reminder back by the snooze window
async fn handle_snooze(
    bot: &Bot,
    (chat_id, message_id): (ChatId, MessageId),
    user_id: i64,
    debt_id: u32,
    created_at: i64,
    services: &ServiceFactory,
) -> Result<()> {
    let now = Local::now().naive_local();
    let text = match services.debt_service.snooze(user_id, debt_id, created_at, now).await {
        Ok(due) => format!("⏸️ Reminder snoozed.\nNext reminder: {}", due.format("%Y/%m/%d %H:%M")),
        Err(KapanBayarError::DebtNotFound { .. }) => {
            "❌ This debt no longer exists or was already changed.".to_string()
        }
        Err(e) => return Err(e),
    };

    bot.edit_message_text(chat_id, message_id, text).await?;
    Ok(())
}
