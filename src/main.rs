//! # Cherepovets Weather Bot Entry Point
//!
//! Initializes logging, loads configuration, sets up the database, spawns
//! the mailing scheduler, starts the health server and runs the Telegram
//! bot dispatcher.

use anyhow::Result;
use chrono::Duration;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use che_weather_bot::bot::handlers::{BotHandler, State};
use che_weather_bot::config::Config;
use che_weather_bot::database::connection::DatabaseManager;
use che_weather_bot::services::health::HealthService;
use che_weather_bot::services::mailing::{MailingService, TelegramNotifier};
use che_weather_bot::services::schedule::align_to_grid;
use che_weather_bot::services::stickers::StickerSet;
use che_weather_bot::services::weather::{CachedWeather, OwmClient};
use che_weather_bot::utils::datetime::che_now;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "che_weather_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Cherepovets Weather Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}, Mailing interval: {}m",
        config.database_url, config.http_port, config.mailing_interval_minutes
    );

    // Initialize database
    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    db_manager.run_migrations().await?;
    let db = Arc::new(db_manager);
    info!("Database initialized successfully");

    // Load the sticker inventory
    let stickers = Arc::new(StickerSet::load(&config.stickers_path)?);

    // Weather source, shared between chat handlers and the mailing scheduler
    let weather = Arc::new(CachedWeather::new(OwmClient::for_che(
        &config.weather_api_key,
    )?));

    // Initialize bot
    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram_bot_token);

    // Start the mailing scheduler: one long-lived task, cancelled at shutdown
    let interval = Duration::minutes(i64::from(config.mailing_interval_minutes));
    let start = align_to_grid(che_now(), interval);
    let mailing = MailingService::new(
        db.as_ref().clone(),
        Arc::clone(&weather),
        TelegramNotifier::new(bot.clone()),
        Arc::clone(&stickers),
    );
    let mut mailing_task = tokio::spawn(async move { mailing.run(start, interval).await });

    // Health server for the hosting platform
    let health_service = HealthService::new(Arc::clone(&db));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;
    info!("Health check server starting on port {}", config.http_port);

    let mut bot_task = tokio::spawn(async move {
        let storage = InMemStorage::<State>::new();
        Dispatcher::builder(bot, BotHandler::schema())
            .dependencies(dptree::deps![storage, db, weather, stickers])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let mut health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    // The mailing loop never returns on its own; its task ending early means
    // it crashed, which is fatal rather than silently restarted.
    tokio::select! {
        result = &mut bot_task => {
            if let Err(e) = result {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result = &mut health_task => {
            if let Err(e) = result {
                tracing::error!("Health task error: {}", e);
            }
        }
        result = &mut mailing_task => {
            tracing::error!("Mailing scheduler terminated unexpectedly: {:?}", result.err());
        }
    }

    mailing_task.abort();
    bot_task.abort();
    health_task.abort();

    info!("Application stopped");
    Ok(())
}
