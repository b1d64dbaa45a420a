use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use marketplace_bot::bot::{self, AppContext, TelegramGateway};
use marketplace_bot::config::BotConfig;
use marketplace_bot::db::{self, SqliteRepository};
use marketplace_bot::dialogue::ChatState;
use marketplace_bot::localization::init_localization;
use marketplace_bot::photo_store::PhotoStore;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.json_logs);

    info!("Starting Marketplace Telegram Bot");

    init_localization().context("Failed to load message catalogs")?;

    info!(database_url = %config.database_url, "Initializing database");
    let pool = db::connect(&config.database_url).await?;
    db::init_database_schema(&pool)
        .await
        .context("Failed to initialize database schema")?;

    let photos = PhotoStore::new(config.photos_dir.clone());
    photos
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create photo directory {}", config.photos_dir.display()))?;

    let bot = Bot::new(config.bot_token.clone());

    let ctx = Arc::new(AppContext::new(
        Arc::new(SqliteRepository::new(pool)),
        Arc::new(TelegramGateway::new(bot.clone())),
        photos,
        config.developer_contact.clone(),
    ));

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<ChatState>, ChatState>()
                .endpoint(bot::message_handler),
        )
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<ChatState>::new(), ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
