//! Owner command handlers

use teloxide::{Bot, types::{InputFile, Message, ParseMode}, prelude::*};
use teloxide::utils::html;
use tracing::warn;
use crate::config::Settings;
use crate::handlers::{group_list_text, sender, user_id_of};
use crate::services::{GroupAdded, ServiceFactory};
use crate::state::{ConversationState, StateStorage};
use crate::utils::errors::Result;
use crate::utils::helpers::{display_group, format_amount_total};
use crate::utils::logging::log_owner_action;

const ACCESS_DENIED: &str = "❌ Access denied!";

/// Reply "access denied" unless the author is the configured owner
async fn require_owner(bot: &Bot, msg: &Message, settings: &Settings) -> Result<Option<i64>> {
    let user_id = user_id_of(sender(msg)?);
    if user_id == settings.bot.owner_id {
        return Ok(Some(user_id));
    }

    warn!(user_id = user_id, "Owner command refused");
    bot.send_message(msg.chat.id, ACCESS_DENIED).await?;
    Ok(None)
}

/// Handle /owner command - list owner commands
pub async fn handle_owner(bot: Bot, msg: Message, settings: &Settings) -> Result<()> {
    if require_owner(&bot, &msg, settings).await?.is_none() {
        return Ok(());
    }

    let text = "👑 <b>Owner Commands</b> 👑\n\n\
        /stats - bot statistics\n\
        /backupuser - export the user registry\n\
        /broadcast - reply to a message to send it to every user\n\
        /addjoin @group - add a mandatory group\n\
        /listjoin - list mandatory groups\n\
        /deljoin - remove a mandatory group\n\
        /statsjoin - join statistics per group";

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /stats command
pub async fn handle_stats(bot: Bot, msg: Message, services: ServiceFactory, settings: &Settings) -> Result<()> {
    let Some(owner_id) = require_owner(&bot, &msg, settings).await? else {
        return Ok(());
    };

    let total_users = services.user_service.total_users().await?;
    let overview = services.debt_service.overview().await?;
    let groups = services.gate_service.list_groups().await?;

    let text = format!(
        "📊 <b>Bot Statistics</b> 📊\n\n\
         👥 <b>Users:</b> {}\n\
         📝 <b>Debts:</b> {}\n\
         💰 <b>Total value:</b> {}\n\
         📁 <b>Debt documents:</b> {}\n\
         🔗 <b>Mandatory groups:</b> {}\n\n\
         🔄 <b>Generated:</b> {}",
        total_users,
        overview.total_debts,
        format_amount_total(overview.total_amount),
        overview.owners,
        groups.len(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    );

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    log_owner_action(owner_id, "stats", None);
    Ok(())
}

/// Handle /backupuser command - send the registry as a JSON document
pub async fn handle_backup_users(bot: Bot, msg: Message, services: ServiceFactory, settings: &Settings) -> Result<()> {
    let Some(owner_id) = require_owner(&bot, &msg, settings).await? else {
        return Ok(());
    };

    let registry = services.user_service.registry().await?;
    let bytes = serde_json::to_vec_pretty(&registry)?;

    bot.send_document(msg.chat.id, InputFile::memory(bytes).file_name("users.json"))
        .caption(format!("📁 User registry backup\nTotal users: {}", registry.len()))
        .await?;

    log_owner_action(owner_id, "backup_users", None);
    Ok(())
}

/// Handle /broadcast command - copy the replied-to message to every user
pub async fn handle_broadcast(bot: Bot, msg: Message, services: ServiceFactory, settings: &Settings) -> Result<()> {
    let Some(owner_id) = require_owner(&bot, &msg, settings).await? else {
        return Ok(());
    };

    let Some(source) = msg.reply_to_message() else {
        bot.send_message(msg.chat.id, "❌ Reply to the message you want to broadcast with /broadcast.")
            .await?;
        return Ok(());
    };

    let total = services.user_service.total_users().await?;
    bot.send_message(msg.chat.id, format!("📢 Broadcasting to {} users...", total))
        .await?;

    let report = services
        .broadcast_service
        .broadcast(source.chat.id, source.id)
        .await?;

    bot.send_message(
        msg.chat.id,
        format!(
            "✅ <b>Broadcast finished!</b>\n\n📤 Sent: {}\n❌ Failed: {}\n📊 Total: {}",
            report.sent, report.failed, report.total
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    log_owner_action(owner_id, "broadcast", Some(&format!("{}/{}", report.sent, report.total)));
    Ok(())
}

/// Handle /addjoin command
pub async fn handle_add_join(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    settings: &Settings,
    group: String,
) -> Result<()> {
    let Some(owner_id) = require_owner(&bot, &msg, settings).await? else {
        return Ok(());
    };

    if group.trim().is_empty() {
        bot.send_message(msg.chat.id, "❌ Usage: /addjoin @group_username\nExample: /addjoin @testchannel")
            .await?;
        return Ok(());
    }

    let text = match services.gate_service.add_group(&group).await {
        Ok(GroupAdded::Added(handle)) => {
            let total = services.gate_service.list_groups().await?.len();
            log_owner_action(owner_id, "add_group", Some(&handle));
            format!(
                "✅ <b>Group added!</b>\n\nGroup: {}\nUsers must join it before using the bot.\n\n📊 Total groups: {}",
                html::escape(&display_group(&handle)),
                total
            )
        }
        Ok(GroupAdded::AlreadyPresent(handle)) => format!(
            "❌ <b>Group is already in the list!</b>\nGroup: {}",
            html::escape(&display_group(&handle))
        ),
        Err(e) => html::escape(&e.user_message()),
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

fn numbered_groups(groups: &[String]) -> String {
    groups
        .iter()
        .enumerate()
        .map(|(i, group)| format!("{}. {}", i + 1, html::escape(&display_group(group))))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Handle /listjoin command
pub async fn handle_list_join(bot: Bot, msg: Message, services: ServiceFactory, settings: &Settings) -> Result<()> {
    if require_owner(&bot, &msg, settings).await?.is_none() {
        return Ok(());
    }

    let groups = services.gate_service.list_groups().await?;
    let text = if groups.is_empty() {
        "📭 <b>No mandatory groups.</b>\nUse /addjoin @group to add one.".to_string()
    } else {
        format!(
            "📋 <b>Mandatory groups:</b>\n\n{}\n\n📊 <b>Total:</b> {} groups",
            numbered_groups(&groups),
            groups.len()
        )
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /deljoin command - ask which group to remove
pub async fn handle_del_join(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    state_storage: StateStorage,
    settings: &Settings,
) -> Result<()> {
    let Some(owner_id) = require_owner(&bot, &msg, settings).await? else {
        return Ok(());
    };

    let groups = services.gate_service.list_groups().await?;
    if groups.is_empty() {
        bot.send_message(msg.chat.id, "📭 No mandatory groups.").await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        format!(
            "🗑️ <b>Choose a group to remove:</b>\n\n{}\n\nSend the group number:",
            numbered_groups(&groups)
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    state_storage.set_state(owner_id, ConversationState::DeletingGroup).await;
    Ok(())
}

/// Handle /statsjoin command - per-group counts plus the raw join cache
pub async fn handle_stats_join(bot: Bot, msg: Message, services: ServiceFactory, settings: &Settings) -> Result<()> {
    let Some(owner_id) = require_owner(&bot, &msg, settings).await? else {
        return Ok(());
    };

    let stats = services.gate_service.join_stats().await?;
    if stats.per_group.is_empty() {
        bot.send_message(msg.chat.id, "📭 No mandatory groups.").await?;
        return Ok(());
    }

    let total_users = services.user_service.total_users().await?;
    let mut text = String::from("📊 Join statistics\n\n");
    for (group, joined) in &stats.per_group {
        let percentage = if total_users > 0 {
            *joined as f64 / total_users as f64 * 100.0
        } else {
            0.0
        };
        text.push_str(&format!(
            "🔗 {}\n   ✅ Joined: {} users\n   📈 Share: {:.1}%\n\n",
            display_group(group),
            joined,
            percentage
        ));
    }
    text.push_str(&format!(
        "👥 Bot users: {}\n🗂️ Users checked: {}",
        total_users, stats.checked_users
    ));

    let snapshot = services.gate_service.all_join_status().await?;
    let bytes = serde_json::to_vec_pretty(&snapshot)?;
    bot.send_document(msg.chat.id, InputFile::memory(bytes).file_name("join_users.json"))
        .caption(text)
        .await?;

    log_owner_action(owner_id, "stats_join", None);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_groups_are_one_based() {
        let groups = vec!["foo".to_string(), "-100123".to_string()];
        assert_eq!(numbered_groups(&groups), "1. @foo\n2. -100123");
    }

    #[test]
    fn test_group_list_uses_display_form() {
        assert_eq!(group_list_text(&["bar".to_string()]), "• @bar");
    }
}
