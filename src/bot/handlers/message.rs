use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::info;

use crate::bot::commands::{forecast, mailing, Command};
use crate::bot::handlers::{BotDialogue, HandlerResult};
use crate::bot::keyboards;
use crate::bot::templates;
use crate::database::connection::DatabaseManager;
use crate::services::stickers::StickerSet;
use crate::services::weather::SharedWeather;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: BotDialogue,
    db: Arc<DatabaseManager>,
) -> HandlerResult {
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, templates::welcome())
                .parse_mode(ParseMode::Markdown)
                .reply_markup(keyboards::main_keyboard())
                .await?;
            if let Some(user) = msg.from() {
                info!(user_id = user.id.0, "user ran /start");
            }
        }
        Command::Help => {
            bot.send_message(msg.chat.id, templates::info())
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        Command::SubscribeToMailing => {
            mailing::handle_subscribe(&bot, &msg, &dialogue).await?;
        }
        Command::ChangeTimeMailing => {
            mailing::handle_change_time(&bot, &msg, &dialogue).await?;
        }
        Command::CancelMailing => {
            mailing::handle_cancel(&bot, &msg, &db).await?;
        }
    }
    Ok(())
}

/// Routes the plain-text buttons of the main reply keyboard. Unknown text is
/// ignored.
pub async fn keyboard_handler(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    db: Arc<DatabaseManager>,
    weather: SharedWeather,
    stickers: Arc<StickerSet>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    match text {
        keyboards::WEATHER => {
            forecast::handle_current_weather(&bot, &msg, &weather, &stickers).await?;
        }
        keyboards::HOUR_FORECAST => {
            forecast::handle_hour_forecast(&bot, &msg, &weather, &stickers).await?;
        }
        keyboards::EXACT_HOUR_FORECAST => {
            forecast::handle_exact_hour_prompt(&bot, &msg, &dialogue).await?;
        }
        keyboards::TOMORROW_FORECAST => {
            forecast::handle_tomorrow_forecast(&bot, &msg, &weather, &stickers).await?;
        }
        keyboards::EXACT_DAY_FORECAST => {
            forecast::handle_exact_day_prompt(&bot, &msg, &dialogue).await?;
        }
        keyboards::MAILING => {
            mailing::handle_mailing_info(&bot, &msg, &db).await?;
        }
        keyboards::HELP => {
            bot.send_message(msg.chat.id, templates::info())
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        _ => {}
    }
    Ok(())
}
