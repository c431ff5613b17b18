//! Civil datetime helpers for Cherepovets (Europe/Moscow).

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// The bot serves a single fixed location, so all user-facing times are in
/// this timezone.
pub const CHE_TZ: Tz = chrono_tz::Europe::Moscow;

pub fn che_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&CHE_TZ)
}

/// The next twelve whole hours after `from`, for the exact-hour forecast
/// keyboard. `from = 14:37` yields `15:00, 16:00, ..., 02:00`.
pub fn next_twelve_hours(from: DateTime<Tz>) -> Vec<DateTime<Tz>> {
    let top_of_hour = from
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(from);
    (1..=12).map(|i| top_of_hour + Duration::hours(i)).collect()
}

/// The next seven days starting from tomorrow, for the exact-day forecast
/// keyboard.
pub fn next_seven_days(from: DateTime<Tz>) -> Vec<DateTime<Tz>> {
    (1..=7).map(|i| from + Duration::days(i)).collect()
}

pub fn format_as_hour(instant: &DateTime<Tz>) -> String {
    instant.format("%H:%M").to_string()
}

/// Day label in the shape "Понедельник - 15.04".
pub fn format_as_day(instant: &DateTime<Tz>) -> String {
    format!("{} - {}", weekday_name(instant), instant.format("%d.%m"))
}

fn weekday_name(instant: &DateTime<Tz>) -> &'static str {
    const WEEKDAYS: [&str; 7] = [
        "Понедельник",
        "Вторник",
        "Среда",
        "Четверг",
        "Пятница",
        "Суббота",
        "Воскресенье",
    ];
    WEEKDAYS[instant.weekday().num_days_from_monday() as usize]
}

/// Civil datetime for a unix timestamp carried in callback data.
pub fn from_callback_timestamp(timestamp: i64) -> Option<DateTime<Tz>> {
    CHE_TZ.timestamp_opt(timestamp, 0).single()
}
