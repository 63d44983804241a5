//! Start command handler

use teloxide::{Bot, types::{Message, ParseMode}, prelude::*};
use teloxide::utils::html;
use tracing::info;
use crate::handlers::keyboards::main_menu_keyboard;
use crate::handlers::{sender, send_join_prompt, user_id_of};
use crate::services::ServiceFactory;
use crate::state::StateStorage;
use crate::utils::errors::Result;
use crate::utils::logging::log_user_action;

/// Handle /start command: register the user, then show the menu or the join prompt
pub async fn handle_start(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    state_storage: StateStorage,
) -> Result<()> {
    let user = sender(&msg)?;
    let user_id = user_id_of(user);
    let chat_id = msg.chat.id;

    let is_new = services
        .user_service
        .register(user_id, user.username.clone(), user.first_name.clone())
        .await?;
    if !is_new {
        services
            .user_service
            .touch(user_id, user.username.clone(), user.first_name.clone())
            .await?;
    }
    state_storage.clear_state(user_id).await;
    log_user_action(user_id, "start", is_new.then_some("new user"));

    if !services.gate_service.is_allowed(user_id).await? {
        let header = format!("👋 <b>Hi {}!</b>", html::escape(&user.first_name));
        return send_join_prompt(&bot, chat_id, &services, &header).await;
    }

    bot.send_message(chat_id, welcome_text(&user.first_name))
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu_keyboard())
        .await?;

    info!(user_id = user_id, "Main menu shown");
    Ok(())
}

fn welcome_text(first_name: &str) -> String {
    format!(
        "✨ <b>Welcome to KapanBayar!</b> ✨\n\n\
         Hi {}! 👋\n\n\
         I keep track of who owes you money and remind you when it is time to collect. 💼\n\n\
         📊 <b>Features:</b>\n\
         • ✅ Record debts with a due date and reminder time\n\
         • 🔔 Automatic reminders\n\
         • 📋 A tidy debt list with totals\n\
         • ⏸️ Pause or tune reminders any time\n\n\
         Use the buttons below to get started! 🚀",
        html::escape(first_name)
    )
}
