//! Keyboard layouts and the button labels used to route plain messages.

use chrono::DateTime;
use chrono_tz::Tz;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::utils::datetime::{format_as_day, format_as_hour, next_seven_days, next_twelve_hours};

pub const WEATHER: &str = "Текущая погода 🌟";
pub const HOUR_FORECAST: &str = "В ближайший час ⛅";
pub const EXACT_HOUR_FORECAST: &str = "В ... часов ☁";
pub const TOMORROW_FORECAST: &str = "На завтра ☔";
pub const EXACT_DAY_FORECAST: &str = "В конкретный день 🌂";
pub const MAILING: &str = "О рассылке 📮";
pub const HELP: &str = "Помощь 📚";

/// The persistent reply keyboard handed out by /start.
pub fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(WEATHER), KeyboardButton::new(HOUR_FORECAST)],
        vec![
            KeyboardButton::new(EXACT_HOUR_FORECAST),
            KeyboardButton::new(TOMORROW_FORECAST),
        ],
        vec![KeyboardButton::new(EXACT_DAY_FORECAST)],
        vec![KeyboardButton::new(MAILING), KeyboardButton::new(HELP)],
    ])
    .resize_keyboard(true)
}

/// Mailing hour picker: 24 buttons in rows of six.
pub fn hour_choice() -> InlineKeyboardMarkup {
    let rows = (0..24u32)
        .map(|hour| InlineKeyboardButton::callback(format!("{hour:02}"), hour.to_string()))
        .collect::<Vec<_>>()
        .chunks(6)
        .map(<[InlineKeyboardButton]>::to_vec)
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Mailing minute picker: one row of quarter-hour boundaries.
pub fn minute_choice() -> InlineKeyboardMarkup {
    let row = (0..60u32)
        .step_by(15)
        .map(|minute| InlineKeyboardButton::callback(format!("{minute:02}"), minute.to_string()))
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![row])
}

/// Forecast hour picker: the next twelve whole hours, rows of three.
/// Callback data is the unix timestamp of the hour.
pub fn forecast_hour_choice(from: DateTime<Tz>) -> InlineKeyboardMarkup {
    let rows = next_twelve_hours(from)
        .iter()
        .map(|hour| {
            InlineKeyboardButton::callback(format_as_hour(hour), hour.timestamp().to_string())
        })
        .collect::<Vec<_>>()
        .chunks(3)
        .map(<[InlineKeyboardButton]>::to_vec)
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Forecast day picker: the next seven days, one per row.
/// Callback data is the unix timestamp of the moment a week-day ahead.
pub fn forecast_day_choice(from: DateTime<Tz>) -> InlineKeyboardMarkup {
    let rows = next_seven_days(from)
        .iter()
        .map(|day| {
            vec![InlineKeyboardButton::callback(
                format_as_day(day),
                day.timestamp().to_string(),
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}
