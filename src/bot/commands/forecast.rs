//! Forecast replies for the reply-keyboard buttons.

use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{error, info};

use crate::bot::handlers::{send_maintenance, BotDialogue, HandlerResult, State};
use crate::bot::keyboards;
use crate::bot::templates;
use crate::services::stickers::StickerSet;
use crate::services::weather::SharedWeather;
use crate::utils::datetime::che_now;

pub async fn handle_current_weather(
    bot: &Bot,
    msg: &Message,
    weather: &SharedWeather,
    stickers: &Arc<StickerSet>,
) -> HandlerResult {
    match weather.current().await {
        Ok(forecast) => {
            send_forecast(
                bot,
                msg.chat.id,
                &forecast.format(),
                stickers.for_weather(forecast.weather_kind()),
            )
            .await?;
            info!(user_id = user_id(msg), "sent current weather");
        }
        Err(err) => {
            error!("current weather unavailable: {err:#}");
            send_maintenance(bot, msg.chat.id, stickers).await?;
        }
    }
    Ok(())
}

pub async fn handle_hour_forecast(
    bot: &Bot,
    msg: &Message,
    weather: &SharedWeather,
    stickers: &Arc<StickerSet>,
) -> HandlerResult {
    match weather.hourly(che_now().with_timezone(&chrono::Utc)).await {
        Ok(forecast) => {
            send_forecast(
                bot,
                msg.chat.id,
                &forecast.format(),
                stickers.for_weather(forecast.weather_kind()),
            )
            .await?;
            info!(user_id = user_id(msg), "sent next-hour forecast");
        }
        Err(err) => {
            error!("hourly forecast unavailable: {err:#}");
            send_maintenance(bot, msg.chat.id, stickers).await?;
        }
    }
    Ok(())
}

pub async fn handle_tomorrow_forecast(
    bot: &Bot,
    msg: &Message,
    weather: &SharedWeather,
    stickers: &Arc<StickerSet>,
) -> HandlerResult {
    match weather.daily(che_now().with_timezone(&chrono::Utc)).await {
        Ok(forecast) => {
            send_forecast(
                bot,
                msg.chat.id,
                &forecast.format(),
                stickers.for_weather(forecast.weather_kind()),
            )
            .await?;
            info!(user_id = user_id(msg), "sent tomorrow forecast");
        }
        Err(err) => {
            error!("daily forecast unavailable: {err:#}");
            send_maintenance(bot, msg.chat.id, stickers).await?;
        }
    }
    Ok(())
}

/// Offers the next twelve hours; the chosen hour is handled by the callback
/// route while the dialogue is in `ChoosingForecastHour`.
pub async fn handle_exact_hour_prompt(
    bot: &Bot,
    msg: &Message,
    dialogue: &BotDialogue,
) -> HandlerResult {
    dialogue.update(State::ChoosingForecastHour).await?;
    bot.send_message(msg.chat.id, templates::CHOOSE_FORECAST_HOUR)
        .reply_markup(keyboards::forecast_hour_choice(che_now()))
        .await?;
    Ok(())
}

/// Offers the next seven days; the chosen day is handled by the callback
/// route while the dialogue is in `ChoosingForecastDay`.
pub async fn handle_exact_day_prompt(
    bot: &Bot,
    msg: &Message,
    dialogue: &BotDialogue,
) -> HandlerResult {
    dialogue.update(State::ChoosingForecastDay).await?;
    bot.send_message(msg.chat.id, templates::CHOOSE_FORECAST_DAY)
        .reply_markup(keyboards::forecast_day_choice(che_now()))
        .await?;
    Ok(())
}

pub async fn send_forecast(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    sticker: &str,
) -> HandlerResult {
    bot.send_sticker(chat_id, InputFile::file_id(sticker.to_owned()))
        .await?;
    bot.send_message(chat_id, text).await?;
    Ok(())
}

fn user_id(msg: &Message) -> i64 {
    msg.from().map(|user| user.id.0 as i64).unwrap_or_default()
}
