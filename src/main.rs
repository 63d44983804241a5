//! KapanBayar Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use teloxide::{prelude::*, types::{CallbackQuery, ChatId, Update}};
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use KapanBayar::{
    config::Settings,
    database::open_store,
    handlers::{handle_callback_query, handle_command, handle_message, Command},
    services::{ReminderHandle, ReminderNotifier, ServiceFactory, TelegramMembershipOracle, TelegramReminderNotifier},
    state::StateStorage,
    utils::{errors::KapanBayarError, logging},
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", KapanBayar::info());

    info!(backend = ?settings.storage.backend, "Opening record store...");
    let store = open_store(&settings.storage).await?;

    let bot = Bot::new(&settings.bot.token);
    let oracle = Arc::new(TelegramMembershipOracle::new(bot.clone(), settings.gate.check_timeout()));

    info!("Initializing services...");
    let services = ServiceFactory::new(bot.clone(), &settings, store, oracle);
    let state_storage = StateStorage::default();
    spawn_state_cleanup(state_storage.clone());

    let notifier: Option<Arc<dyn ReminderNotifier>> = if settings.reminders.send_notifications {
        Some(Arc::new(TelegramReminderNotifier::new(bot.clone())))
    } else {
        warn!("Reminder notifications are disabled, the scanner only records fires");
        None
    };
    let reminders = ReminderHandle::spawn(services.reminder_scanner(notifier), settings.reminders.scan_period());

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    let settings = Arc::new(settings);
    let mut dispatcher = Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![services, state_storage, settings])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.kind);
        })
        .enable_ctrlc_handler()
        .build();

    info!("KapanBayar bot is ready, polling for updates");
    dispatcher.dispatch().await;

    info!("Dispatcher stopped, shutting down reminder scanner...");
    reminders.shutdown().await;

    info!("KapanBayar bot has been shut down.");
    Ok(())
}

/// Periodically drop conversation prompts nobody answered
fn spawn_state_cleanup(state_storage: StateStorage) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            ticker.tick().await;
            let removed = state_storage.cleanup_expired().await;
            if removed > 0 {
                debug!(removed = removed, "Expired conversation states removed");
            }
        }
    });
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_commands),
                )
                .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
}

/// Tell the chat something went wrong, then pass the error to the dispatcher
async fn report_failure(bot: &Bot, chat_id: ChatId, context: &str, e: KapanBayarError) -> HandlerResult {
    error!(error = %e, severity = ?e.severity(), recoverable = e.is_recoverable(), "Error handling {}", context);
    if let Err(send_error) = bot.send_message(chat_id, e.user_message()).await {
        warn!(error = %send_error, "Failed to report error to chat");
    }
    Err(e.into())
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: ServiceFactory,
    state_storage: StateStorage,
    settings: Arc<Settings>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    match handle_command(bot.clone(), msg, cmd, services, state_storage, settings).await {
        Ok(()) => Ok(()),
        Err(e) => report_failure(&bot, chat_id, "command", e).await,
    }
}

/// Handle regular messages
async fn handle_messages(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    state_storage: StateStorage,
    settings: Arc<Settings>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    match handle_message(bot.clone(), msg, services, state_storage, settings).await {
        Ok(()) => Ok(()),
        Err(e) => report_failure(&bot, chat_id, "message", e).await,
    }
}

/// Handle callback queries
async fn handle_callbacks(bot: Bot, query: CallbackQuery, services: ServiceFactory) -> HandlerResult {
    let chat_id = query.message.as_ref().map(|m| m.chat().id);
    match handle_callback_query(bot.clone(), query, services).await {
        Ok(()) => Ok(()),
        Err(e) => match chat_id {
            Some(chat_id) => report_failure(&bot, chat_id, "callback query", e).await,
            None => {
                error!(error = %e, "Error handling callback query");
                Err(e.into())
            }
        },
    }
}
