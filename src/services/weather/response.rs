//! Data model of the OpenWeatherMap One Call payload.
//!
//! Only the fields the bot renders are kept. Example payload:
//! <https://openweathermap.org/api/one-call-api#example>

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The `weather` array element: a short type ("Clouds", "Rain", ...) plus a
/// localized description.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherDescription {
    pub main: String,
    pub description: String,
}

/// Weather at a single moment; used for both `current` and `hourly` entries.
#[derive(Debug, Clone, Deserialize)]
pub struct Weather {
    #[serde(rename = "dt", with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub humidity: i64,
    #[serde(rename = "clouds")]
    pub cloudiness: i64,
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(rename = "weather")]
    pub descriptions: Vec<WeatherDescription>,
    pub temp: f64,
    pub feels_like: f64,
}

/// Per-day-part temperatures of a daily forecast entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyTemperature {
    #[serde(rename = "morn")]
    pub morning: f64,
    pub day: f64,
    #[serde(rename = "eve")]
    pub evening: f64,
    pub night: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-day-part feels-like temperatures of a daily forecast entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyFeelsLike {
    #[serde(rename = "morn")]
    pub morning: f64,
    pub day: f64,
    #[serde(rename = "eve")]
    pub evening: f64,
    pub night: f64,
}

/// Weather for a whole day.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyWeather {
    #[serde(rename = "dt", with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub humidity: i64,
    #[serde(rename = "clouds")]
    pub cloudiness: i64,
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(rename = "weather")]
    pub descriptions: Vec<WeatherDescription>,
    pub temp: DailyTemperature,
    pub feels_like: DailyFeelsLike,
}

/// A weather warning ("Ветер", "Гроза", ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Alert {
    pub event: String,
    pub description: String,
}

impl Alert {
    /// The provider mixes localized and English copies of the same warning;
    /// only the Russian ones are shown to users.
    pub fn is_english(&self) -> bool {
        self.event.chars().any(|c| c.is_ascii_alphabetic())
    }
}

/// The full One Call response: current weather plus hourly and daily
/// forecasts and any active alerts.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherResponse {
    pub current: Weather,
    pub hourly: Vec<Weather>,
    pub daily: Vec<DailyWeather>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

impl WeatherResponse {
    pub fn retain_russian_alerts(&mut self) {
        self.alerts.retain(|alert| !alert.is_english());
    }
}
