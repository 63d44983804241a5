//! Help command handler

use teloxide::{Bot, types::{Message, ParseMode}, prelude::*};
use crate::handlers::keyboards::main_menu_keyboard;
use crate::handlers::{sender, touch_user};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

pub const HELP_TEXT: &str = "📚 <b>KapanBayar Guide</b> 📚\n\n\
    ✨ <b>Menu:</b>\n\
    1. ➕ <b>Add Debt</b> - record a new debt\n\
    2. 🗑️ <b>Delete Debt</b> - remove a settled debt\n\
    3. 📋 <b>Debt List</b> - every recorded debt with the total\n\
    4. ⏸️ <b>Reminder Interval</b> - minutes between reminders, 0 turns them off\n\n\
    📝 <b>Recording a debt:</b>\n\
    Send <code>Name | Amount | Date | Time | Notes</code>\n\
    Example: <code>John | 100k | 2025/12/20 | 12:30 | Lunch</code>\n\
    Date (YYYY/MM/DD), time (HH:MM, 24h) and notes are optional.\n\n\
    🔔 <b>Reminders:</b>\n\
    • A reminder fires once a day once the due time has passed\n\
    • Press <b>Paid</b> to remove the debt or <b>Snooze</b> to be reminded later\n\
    • /pause and /resume switch reminders off and on";

/// Handle /help command and the guide menu button
pub async fn handle_help(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    touch_user(&services, sender(&msg)?).await?;

    bot.send_message(msg.chat.id, HELP_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}
