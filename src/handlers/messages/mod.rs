//! Message handlers module
//!
//! Handles menu button presses and the plain-text answers to pending prompts

mod prompts;

use std::sync::Arc;
use teloxide::{Bot, types::{Message, ParseMode}, prelude::*};
use teloxide::utils::html;
use tracing::debug;
use crate::config::Settings;
use crate::handlers::commands::help::HELP_TEXT;
use crate::handlers::keyboards::{main_menu_keyboard, MenuButton};
use crate::handlers::{send_join_prompt, sender, touch_user, user_id_of};
use crate::models::UserDebts;
use crate::services::ServiceFactory;
use crate::state::{ConversationState, StateStorage};
use crate::utils::errors::Result;
use crate::utils::helpers::format_amount_total;
use crate::utils::logging::log_user_action;

const RESTRICTED_HEADER: &str = "⛔ <b>Access restricted</b>";

pub(crate) const ADD_DEBT_PROMPT: &str = "📝 <b>Record a new debt</b>\n\n\
    Send it in this format:\n\
    <code>Name | Amount | Date | Time | Notes</code>\n\n\
    Example:\n\
    <code>John | 100k | 2025/12/20 | 12:30 | Lunch</code>\n\n\
    Only name and amount are required.";

/// Handle incoming text messages
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    state_storage: StateStorage,
    settings: Arc<Settings>,
) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user = sender(&msg)?;
    let user_id = user_id_of(user);
    let chat_id = msg.chat.id;

    touch_user(&services, user).await?;

    let button = MenuButton::from_text(text);

    // The owner answers the group removal prompt without passing the gate
    if button.is_none() && user_id == settings.bot.owner_id {
        if let Some(ConversationState::DeletingGroup) = state_storage.current_state(user_id).await {
            return prompts::handle_group_removal(&bot, &msg, text, &services, &state_storage).await;
        }
    }

    if !services.gate_service.is_allowed(user_id).await? {
        let header = match button {
            Some(MenuButton::BackToMenu) => format!("👋 <b>Hi {}!</b>", html::escape(&user.first_name)),
            _ => RESTRICTED_HEADER.to_string(),
        };
        return send_join_prompt(&bot, chat_id, &services, &header).await;
    }

    if let Some(button) = button {
        return handle_menu_button(&bot, &msg, button, &services, &state_storage).await;
    }

    match state_storage.current_state(user_id).await {
        Some(ConversationState::AddingDebt) => {
            prompts::handle_debt_input(&bot, &msg, text, &services, &state_storage).await
        }
        Some(ConversationState::DeletingDebt) => {
            prompts::handle_debt_deletion(&bot, &msg, text, &services, &state_storage).await
        }
        Some(ConversationState::SettingInterval) => {
            prompts::handle_interval_input(&bot, &msg, text, &services, &state_storage).await
        }
        Some(ConversationState::DeletingGroup) => {
            // Only reachable by a non-owner holding a stale state
            state_storage.clear_state(user_id).await;
            Ok(())
        }
        None => {
            debug!(user_id = user_id, "Unrouted text, showing menu");
            bot.send_message(chat_id, "🤖 Use the menu buttons below:")
                .reply_markup(main_menu_keyboard())
                .await?;
            Ok(())
        }
    }
}

async fn handle_menu_button(
    bot: &Bot,
    msg: &Message,
    button: MenuButton,
    services: &ServiceFactory,
    state_storage: &StateStorage,
) -> Result<()> {
    let user_id = user_id_of(sender(msg)?);
    let chat_id = msg.chat.id;
    state_storage.clear_state(user_id).await;

    match button {
        MenuButton::AddDebt => {
            bot.send_message(chat_id, ADD_DEBT_PROMPT)
                .parse_mode(ParseMode::Html)
                .await?;
            state_storage.set_state(user_id, ConversationState::AddingDebt).await;
        }
        MenuButton::DeleteDebt => {
            let debts = services.debt_service.list_debts(user_id).await?;
            if debts.debts.is_empty() {
                bot.send_message(chat_id, "📭 You have no recorded debts.").await?;
                return Ok(());
            }

            bot.send_message(
                chat_id,
                format!(
                    "🗑️ <b>Choose a debt to delete:</b>\n\n{}\n\nSend the debt number:",
                    short_debt_list(&debts)
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
            state_storage.set_state(user_id, ConversationState::DeletingDebt).await;
        }
        MenuButton::ListDebts => {
            let debts = services.debt_service.list_debts(user_id).await?;
            bot.send_message(chat_id, debt_list_text(&debts))
                .parse_mode(ParseMode::Html)
                .reply_markup(main_menu_keyboard())
                .await?;
        }
        MenuButton::ReminderInterval => {
            let debts = services.debt_service.list_debts(user_id).await?;
            bot.send_message(
                chat_id,
                format!(
                    "⏸️ <b>Reminder interval</b>\n\nCurrent: {}\n\n\
                     Send the interval in minutes (0 turns reminders off):",
                    interval_label(debts.notification_interval)
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
            state_storage.set_state(user_id, ConversationState::SettingInterval).await;
        }
        MenuButton::Guide => {
            bot.send_message(chat_id, HELP_TEXT)
                .parse_mode(ParseMode::Html)
                .reply_markup(main_menu_keyboard())
                .await?;
        }
        MenuButton::BackToMenu => {
            bot.send_message(chat_id, "🏠 Main menu:")
                .reply_markup(main_menu_keyboard())
                .await?;
        }
    }

    log_user_action(user_id, "menu", Some(button.label()));
    Ok(())
}

pub(crate) fn interval_label(minutes: u32) -> String {
    if minutes == 0 {
        "off".to_string()
    } else {
        format!("every {} minutes", minutes)
    }
}

/// `1. Name - Amount` lines for the delete prompt
pub(crate) fn short_debt_list(debts: &UserDebts) -> String {
    debts
        .debts
        .iter()
        .map(|d| format!("{}. {} - {}", d.id, html::escape(&d.debtor_name), html::escape(&d.amount)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full debt list with due dates, notes and the total
pub(crate) fn debt_list_text(debts: &UserDebts) -> String {
    if debts.debts.is_empty() {
        return "📭 You have no recorded debts.\nPress ➕ Add Debt to record one.".to_string();
    }

    let mut text = String::from("📋 <b>Your debts</b>\n\n");
    for debt in &debts.debts {
        text.push_str(&format!(
            "{}. <b>{}</b>\n   💰 {}\n",
            debt.id,
            html::escape(&debt.debtor_name),
            html::escape(&debt.amount)
        ));
        if let Some(date) = &debt.due_date {
            let time = debt.remind_at.as_deref().unwrap_or("-");
            text.push_str(&format!(
                "   📅 {} ⏰ {}\n",
                html::escape(date),
                html::escape(time)
            ));
        }
        if !debt.note.is_empty() {
            text.push_str(&format!("   📝 {}\n", html::escape(&debt.note)));
        }
        text.push('\n');
    }

    let status = if debts.is_notification_paused {
        "paused".to_string()
    } else {
        interval_label(debts.notification_interval)
    };
    text.push_str(&format!(
        "💰 <b>Total:</b> {}\n🔔 <b>Reminders:</b> {}",
        format_amount_total(debts.total_amount()),
        status
    ));
    text
}
