use anyhow::{anyhow, Result};
use std::env;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub weather_api_key: String,
    pub database_url: String,
    pub http_port: u16,
    pub stickers_path: String,
    /// Spacing of mailing passes in minutes. Should evenly divide a day so
    /// the schedule stays aligned to the same times every day.
    pub mailing_interval_minutes: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let weather_api_key = env::var("WEATHER_API_KEY")
            .map_err(|_| anyhow!("WEATHER_API_KEY must be set"))?;

        if weather_api_key.trim().is_empty() {
            return Err(anyhow!("WEATHER_API_KEY must be set"));
        }

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./data/subscribers.db".to_string());
        let database_url = if database_url.trim().is_empty() {
            "sqlite:./data/subscribers.db".to_string()
        } else {
            database_url
        };

        let port_str = env::var("HTTP_PORT").unwrap_or_else(|_| "3000".to_string());
        let http_port = port_str
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        let stickers_path =
            env::var("STICKERS_PATH").unwrap_or_else(|_| "stickers.json".to_string());

        let interval_str =
            env::var("MAILING_INTERVAL_MINUTES").unwrap_or_else(|_| "15".to_string());
        let mailing_interval_minutes: u32 = interval_str
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid MAILING_INTERVAL_MINUTES"))?;
        if mailing_interval_minutes == 0 {
            return Err(anyhow!("MAILING_INTERVAL_MINUTES must be positive"));
        }

        Ok(Config {
            telegram_bot_token: token,
            weather_api_key,
            database_url,
            http_port,
            stickers_path,
            mailing_interval_minutes,
        })
    }
}
