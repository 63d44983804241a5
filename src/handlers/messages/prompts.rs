//! Answers to pending prompts

use teloxide::{Bot, types::{Message, ParseMode}, prelude::*};
use teloxide::utils::html;
use tracing::info;
use crate::handlers::keyboards::main_menu_keyboard;
use crate::handlers::{sender, user_id_of};
use crate::models::NewDebt;
use crate::services::{DebtService, ServiceFactory};
use crate::state::StateStorage;
use crate::utils::errors::{KapanBayarError, Result};
use crate::utils::helpers::{display_group, DUE_DATE_FORMAT, REMIND_TIME_FORMAT};
use crate::utils::logging::{log_owner_action, log_user_action};
use super::interval_label;

/// `Name | Amount | Date | Time | Notes`; a bad line keeps the prompt open
pub(super) async fn handle_debt_input(
    bot: &Bot,
    msg: &Message,
    text: &str,
    services: &ServiceFactory,
    state_storage: &StateStorage,
) -> Result<()> {
    let user_id = user_id_of(sender(msg)?);

    let debt = match NewDebt::parse(text) {
        Ok(debt) => debt,
        Err(e @ KapanBayarError::InvalidInput(_)) => {
            bot.send_message(msg.chat.id, e.user_message()).await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let mut summary = format!(
        "✅ <b>Debt recorded!</b>\n\n👤 {}\n💰 {}",
        html::escape(&debt.debtor_name),
        html::escape(&debt.amount)
    );
    if let Some(date) = debt.due_date {
        summary.push_str(&format!("\n📅 {}", date.format(DUE_DATE_FORMAT)));
    }
    if let Some(time) = debt.remind_at {
        summary.push_str(&format!("\n⏰ {}", time.format(REMIND_TIME_FORMAT)));
    }
    if !debt.note.is_empty() {
        summary.push_str(&format!("\n📝 {}", html::escape(&debt.note)));
    }

    let id = services.debt_service.add_debt(user_id, debt).await?;
    state_storage.clear_state(user_id).await;
    log_user_action(user_id, "add_debt", Some(&format!("#{}", id)));

    bot.send_message(msg.chat.id, summary)
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}

/// Debt number to delete; anything else ends the prompt
pub(super) async fn handle_debt_deletion(
    bot: &Bot,
    msg: &Message,
    text: &str,
    services: &ServiceFactory,
    state_storage: &StateStorage,
) -> Result<()> {
    let user_id = user_id_of(sender(msg)?);
    state_storage.clear_state(user_id).await;

    let Ok(debt_id) = text.trim().parse::<u32>() else {
        bot.send_message(msg.chat.id, "❌ Enter a valid debt number!")
            .reply_markup(main_menu_keyboard())
            .await?;
        return Ok(());
    };

    let reply = if services.debt_service.delete_debt(user_id, debt_id).await? {
        log_user_action(user_id, "delete_debt", Some(&format!("#{}", debt_id)));
        format!("✅ Debt #{} deleted.", debt_id)
    } else {
        format!("❌ Debt #{} was not found.", debt_id)
    };

    bot.send_message(msg.chat.id, reply)
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}

/// Reminder interval in minutes; invalid numbers keep the prompt open
pub(super) async fn handle_interval_input(
    bot: &Bot,
    msg: &Message,
    text: &str,
    services: &ServiceFactory,
    state_storage: &StateStorage,
) -> Result<()> {
    let user_id = user_id_of(sender(msg)?);

    let minutes = match DebtService::parse_interval(text) {
        Ok(minutes) => services.debt_service.set_interval(user_id, minutes).await,
        Err(e) => Err(e),
    };

    let minutes = match minutes {
        Ok(minutes) => minutes,
        Err(e @ KapanBayarError::InvalidInput(_)) => {
            bot.send_message(msg.chat.id, e.user_message()).await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    state_storage.clear_state(user_id).await;
    log_user_action(user_id, "set_interval", Some(&minutes.to_string()));

    let reply = if minutes == 0 {
        "🔕 Reminders turned off.".to_string()
    } else {
        format!("✅ Reminders set: {}.", interval_label(minutes))
    };
    bot.send_message(msg.chat.id, reply)
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}

/// Group position from the /deljoin list (owner only)
pub(super) async fn handle_group_removal(
    bot: &Bot,
    msg: &Message,
    text: &str,
    services: &ServiceFactory,
    state_storage: &StateStorage,
) -> Result<()> {
    let owner_id = user_id_of(sender(msg)?);
    state_storage.clear_state(owner_id).await;

    let Ok(position) = text.trim().parse::<usize>() else {
        bot.send_message(msg.chat.id, "❌ Enter a valid number!").await?;
        return Ok(());
    };

    let reply = match services.gate_service.remove_group(position).await {
        Ok(group) => {
            let remaining = services.gate_service.list_groups().await?.len();
            log_owner_action(owner_id, "remove_group", Some(&group));
            format!(
                "✅ <b>Group removed!</b>\n\nGroup: {}\n📊 Remaining groups: {}",
                html::escape(&display_group(&group)),
                remaining
            )
        }
        Err(e @ KapanBayarError::InvalidInput(_)) => html::escape(&e.user_message()),
        Err(e) => return Err(e),
    };

    info!(owner_id = owner_id, position = position, "Group removal answered");
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
