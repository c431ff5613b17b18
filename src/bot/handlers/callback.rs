use chrono::NaiveTime;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info, warn};

use crate::bot::commands::forecast::send_forecast;
use crate::bot::handlers::{send_maintenance, BotDialogue, HandlerResult, State};
use crate::bot::keyboards;
use crate::bot::templates;
use crate::database::connection::DatabaseManager;
use crate::database::models::Subscriber;
use crate::services::stickers::StickerSet;
use crate::services::weather::SharedWeather;
use crate::utils::datetime::{format_as_day, format_as_hour, from_callback_timestamp};

/// Dispatches inline-keyboard picks according to the dialogue state: the
/// forecast hour/day pickers and the two-step mailing time picker.
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: BotDialogue,
    db: Arc<DatabaseManager>,
    weather: SharedWeather,
    stickers: Arc<StickerSet>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(data), Some(message)) = (q.data.clone(), q.message.clone()) else {
        return Ok(());
    };

    match dialogue.get_or_default().await? {
        State::Idle => {
            // A press on a stale keyboard from a finished dialogue.
        }
        State::ChoosingForecastHour => {
            handle_forecast_hour(&bot, &q, &message, &data, &dialogue, &weather, &stickers).await?;
        }
        State::ChoosingForecastDay => {
            handle_forecast_day(&bot, &q, &message, &data, &dialogue, &weather, &stickers).await?;
        }
        State::ChoosingMailingHour { change } => {
            handle_mailing_hour(&bot, &message, &data, &dialogue, change).await?;
        }
        State::ChoosingMailingMinute { change, hour } => {
            handle_mailing_minute(&bot, &q, &message, &data, &dialogue, &db, change, hour).await?;
        }
    }
    Ok(())
}

async fn handle_forecast_hour(
    bot: &Bot,
    q: &CallbackQuery,
    message: &Message,
    data: &str,
    dialogue: &BotDialogue,
    weather: &SharedWeather,
    stickers: &Arc<StickerSet>,
) -> HandlerResult {
    dialogue.exit().await?;

    let Some(hour) = data.parse::<i64>().ok().and_then(from_callback_timestamp) else {
        warn!(data, "unparseable forecast hour callback");
        return Ok(());
    };

    match weather.exact_hour(hour.timestamp()).await {
        Ok(forecast) => {
            let label = format_as_hour(&hour);
            bot.edit_message_text(message.chat.id, message.id, format!("Прогноз на {label}"))
                .await?;
            send_forecast(
                bot,
                message.chat.id,
                &forecast.format(),
                stickers.for_weather(forecast.weather_kind()),
            )
            .await?;
            info!(user_id = q.from.id.0, hour = %label, "sent exact-hour forecast");
        }
        Err(err) => {
            error!("exact-hour forecast unavailable: {err:#}");
            send_maintenance(bot, message.chat.id, stickers).await?;
        }
    }
    Ok(())
}

async fn handle_forecast_day(
    bot: &Bot,
    q: &CallbackQuery,
    message: &Message,
    data: &str,
    dialogue: &BotDialogue,
    weather: &SharedWeather,
    stickers: &Arc<StickerSet>,
) -> HandlerResult {
    dialogue.exit().await?;

    let Some(day) = data.parse::<i64>().ok().and_then(from_callback_timestamp) else {
        warn!(data, "unparseable forecast day callback");
        return Ok(());
    };

    match weather.exact_day(day.date_naive()).await {
        Ok(forecast) => {
            let label = format_as_day(&day);
            bot.edit_message_text(message.chat.id, message.id, format!("Прогноз на {label}"))
                .await?;
            send_forecast(
                bot,
                message.chat.id,
                &forecast.format(),
                stickers.for_weather(forecast.weather_kind()),
            )
            .await?;
            info!(user_id = q.from.id.0, day = %label, "sent exact-day forecast");
        }
        Err(err) => {
            error!("exact-day forecast unavailable: {err:#}");
            send_maintenance(bot, message.chat.id, stickers).await?;
        }
    }
    Ok(())
}

async fn handle_mailing_hour(
    bot: &Bot,
    message: &Message,
    data: &str,
    dialogue: &BotDialogue,
    change: bool,
) -> HandlerResult {
    let Some(hour) = data.parse::<u32>().ok().filter(|hour| *hour < 24) else {
        warn!(data, "unparseable mailing hour callback");
        return Ok(());
    };

    dialogue
        .update(State::ChoosingMailingMinute { change, hour })
        .await?;
    bot.edit_message_text(message.chat.id, message.id, templates::CHOOSE_MINUTE)
        .reply_markup(keyboards::minute_choice())
        .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_mailing_minute(
    bot: &Bot,
    q: &CallbackQuery,
    message: &Message,
    data: &str,
    dialogue: &BotDialogue,
    db: &Arc<DatabaseManager>,
    change: bool,
    hour: u32,
) -> HandlerResult {
    let Some(mailing_time) = data
        .parse::<u32>()
        .ok()
        .and_then(|minute| NaiveTime::from_hms_opt(hour, minute, 0))
    else {
        warn!(data, "unparseable mailing minute callback");
        return Ok(());
    };

    dialogue.exit().await?;
    // The picker keyboard is no longer useful.
    bot.delete_message(message.chat.id, message.id).await?;

    let user_id = q.from.id.0 as i64;
    match Subscriber::upsert(&db.pool, user_id, mailing_time).await {
        Ok(_) => {
            let text = if change {
                templates::user_changed_mailing_time(mailing_time)
            } else {
                templates::user_subscribed(mailing_time)
            };
            bot.send_message(message.chat.id, text).await?;
            if change {
                info!(user_id, %mailing_time, "subscriber changed mailing time");
            } else {
                info!(user_id, %mailing_time, "subscriber joined the mailing");
            }
        }
        Err(err) => {
            error!("failed to store subscriber {user_id}: {err:#}");
            bot.send_message(message.chat.id, templates::MAINTENANCE_MESSAGE)
                .await?;
        }
    }
    Ok(())
}
