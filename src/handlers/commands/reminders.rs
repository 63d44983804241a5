//! Reminder pause/resume command handlers

use teloxide::{Bot, types::Message, prelude::*};
use crate::handlers::keyboards::main_menu_keyboard;
use crate::handlers::{ensure_allowed, sender, touch_user, user_id_of};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::logging::log_user_action;

/// Handle /pause and /resume
pub async fn handle_pause(bot: Bot, msg: Message, services: ServiceFactory, paused: bool) -> Result<()> {
    let user = sender(&msg)?;
    let user_id = user_id_of(user);
    touch_user(&services, user).await?;

    if !ensure_allowed(&bot, msg.chat.id, user_id, &services, "⛔ <b>Access restricted</b>").await? {
        return Ok(());
    }

    services.debt_service.set_paused(user_id, paused).await?;
    log_user_action(user_id, if paused { "pause" } else { "resume" }, None);

    let text = if paused {
        "🔕 Reminders paused. Use /resume to turn them back on."
    } else {
        "🔔 Reminders resumed."
    };

    bot.send_message(msg.chat.id, text)
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}
