//! Bot handlers module
//!
//! This module contains all Telegram bot handlers organized by type:
//! - Command handlers for bot commands
//! - Callback handlers for inline keyboard interactions
//! - Message handlers for menu buttons and prompt answers

pub mod commands;
pub mod callbacks;
pub mod messages;
pub mod keyboards;

use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode, User};
use teloxide::utils::html;
use tracing::debug;
use crate::services::ServiceFactory;
use crate::utils::errors::{KapanBayarError, Result};
use crate::utils::helpers::display_group;
use self::keyboards::join_keyboard;

// Re-export commonly used handler functions
pub use commands::{handle_command, Command};
pub use callbacks::handle_callback_query;
pub use messages::handle_message;

/// Telegram user id of the message author
pub(crate) fn sender(msg: &Message) -> Result<&User> {
    msg.from
        .as_ref()
        .ok_or_else(|| KapanBayarError::InvalidInput("No user in message".to_string()))
}

pub(crate) fn user_id_of(user: &User) -> i64 {
    user.id.0 as i64
}

/// Record the author's activity in the user registry
pub(crate) async fn touch_user(services: &ServiceFactory, user: &User) -> Result<()> {
    services
        .user_service
        .touch(user_id_of(user), user.username.clone(), user.first_name.clone())
        .await
}

/// Bullet list of the mandatory groups for prompts
pub(crate) fn group_list_text(groups: &[String]) -> String {
    groups
        .iter()
        .map(|group| format!("• {}", html::escape(&display_group(group))))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run the gate; when the user is denied, send the join prompt and return false
pub(crate) async fn ensure_allowed(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    services: &ServiceFactory,
    header: &str,
) -> Result<bool> {
    if services.gate_service.is_allowed(user_id).await? {
        return Ok(true);
    }

    debug!(user_id = user_id, "Gated feature refused, sending join prompt");
    send_join_prompt(bot, chat_id, services, header).await?;
    Ok(false)
}

pub(crate) async fn send_join_prompt(
    bot: &Bot,
    chat_id: ChatId,
    services: &ServiceFactory,
    header: &str,
) -> Result<()> {
    let groups = services.gate_service.list_groups().await?;
    let text = format!(
        "{}\n\nYou need to join these groups/channels first:\n\n{}\n\n\
         ✅ After joining, press <b>I've joined</b> below.",
        header,
        group_list_text(&groups),
    );

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(join_keyboard(&groups))
        .await?;
    Ok(())
}
