use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::update_listeners::webhooks;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use vidbot::bot::commands::COMMAND_TABLE;
use vidbot::bot::{self, BotContext};
use vidbot::config::{BotConfig, DeliveryMode, LogFormat};
use vidbot::db::{self, MemoryRecordStore, PgRecordStore, RecordStore};
use vidbot::generation::GenerationService;
use vidbot::localization::{init_localization, t};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}

async fn connect_store(config: &BotConfig) -> Result<Arc<dyn RecordStore>> {
    match &config.database_url {
        Some(database_url) => {
            info!("Connecting to the video database");
            let pool = db::create_pool(database_url, config.max_connections).await?;
            db::init_database_schema(&pool).await?;
            Ok(Arc::new(PgRecordStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, videos are kept in memory only");
            Ok(Arc::new(MemoryRecordStore::new()))
        }
    }
}

async fn register_commands(bot: &Bot) {
    let commands = COMMAND_TABLE
        .iter()
        .map(|(name, _, description_key)| BotCommand::new(*name, t(description_key)))
        .collect::<Vec<_>>();

    if let Err(e) = bot.set_my_commands(commands).await {
        warn!(error = %e, "Failed to register the command menu");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting video catalog bot");

    init_localization()?;

    let store = connect_store(&config).await?;
    let generation = GenerationService::from_config(&config.generation, config.timeouts.generation)?;

    let bot = Bot::new(&config.bot_token);

    let bot_username = match bot.get_me().await {
        Ok(me) => me.user.username.clone(),
        Err(e) => {
            warn!(error = %e, "Could not fetch bot identity, @mentions will not be checked");
            None
        }
    };

    register_commands(&bot).await;

    let ctx = Arc::new(BotContext::new(
        store,
        generation,
        config.timeouts.clone(),
        bot_username,
    ));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(bot::message_handler))
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![ctx])
        .default_handler(|update| async move {
            debug!(update_id = ?update.id, "Unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build();

    match &config.delivery {
        DeliveryMode::Polling => {
            info!("Bot is running and polling for updates...");
            dispatcher.dispatch().await;
        }
        DeliveryMode::Webhook { host, port } => {
            let url: reqwest::Url =
                format!("{host}{}", DeliveryMode::webhook_path(&config.bot_token)).parse()?;
            let address = DeliveryMode::listen_addr(*port);

            let listener = webhooks::axum(bot, webhooks::Options::new(address, url)).await?;

            info!(%address, "Bot is running with webhooks...");
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
    }

    Ok(())
}
