//! Command handlers module
//!
//! This module contains handlers for all bot commands like /start, /help, etc.

pub mod start;
pub mod help;
pub mod reminders;
pub mod owner;

use std::sync::Arc;
use teloxide::{Bot, types::Message, utils::command::BotCommands};
use crate::config::Settings;
use crate::utils::errors::Result;
use crate::services::ServiceFactory;
use crate::state::StateStorage;

/// All available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "KapanBayar commands:")]
pub enum Command {
    #[command(description = "Start the bot and show the main menu")]
    Start,
    #[command(description = "Show the usage guide")]
    Help,
    #[command(description = "Pause debt reminders")]
    Pause,
    #[command(description = "Resume debt reminders")]
    Resume,
    #[command(description = "Owner commands overview (owner only)")]
    Owner,
    #[command(description = "Show bot statistics (owner only)")]
    Stats,
    #[command(description = "Export the user registry (owner only)")]
    BackupUser,
    #[command(description = "Reply to a message to send it to every user (owner only)")]
    Broadcast,
    #[command(description = "Add a mandatory group: /addjoin @group (owner only)")]
    AddJoin(String),
    #[command(description = "List mandatory groups (owner only)")]
    ListJoin,
    #[command(description = "Remove a mandatory group (owner only)")]
    DelJoin,
    #[command(description = "Join statistics per group (owner only)")]
    StatsJoin,
}

/// Main command dispatcher
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: ServiceFactory,
    state_storage: StateStorage,
    settings: Arc<Settings>,
) -> Result<()> {
    match cmd {
        Command::Start => start::handle_start(bot, msg, services, state_storage).await,
        Command::Help => help::handle_help(bot, msg, services).await,
        Command::Pause => reminders::handle_pause(bot, msg, services, true).await,
        Command::Resume => reminders::handle_pause(bot, msg, services, false).await,
        Command::Owner => owner::handle_owner(bot, msg, &settings).await,
        Command::Stats => owner::handle_stats(bot, msg, services, &settings).await,
        Command::BackupUser => owner::handle_backup_users(bot, msg, services, &settings).await,
        Command::Broadcast => owner::handle_broadcast(bot, msg, services, &settings).await,
        Command::AddJoin(group) => owner::handle_add_join(bot, msg, services, &settings, group).await,
        Command::ListJoin => owner::handle_list_join(bot, msg, services, &settings).await,
        Command::DelJoin => owner::handle_del_join(bot, msg, services, state_storage, &settings).await,
        Command::StatsJoin => owner::handle_stats_join(bot, msg, services, &settings).await,
    }
}
