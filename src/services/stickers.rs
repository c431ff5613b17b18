//! Sticker inventory attached to forecasts.
//!
//! Stickers live in a JSON file keyed by weather type ("Clear", "Rain", ...)
//! plus a fallback pool for unrecognized weather and a maintenance sticker
//! for unexpected handler failures.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerSet {
    maintenance_sticker: String,
    undefined_weather_stickers: Vec<String>,
    weather_types: HashMap<String, Vec<String>>,
}

impl StickerSet {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read sticker file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("malformed sticker file {}", path.display()))
    }

    /// A random sticker for the weather type, falling back to the
    /// unrecognized-weather pool for types missing from the inventory.
    pub fn for_weather(&self, weather_kind: &str) -> &str {
        let pool = match self.weather_types.get(weather_kind) {
            Some(pool) if !pool.is_empty() => pool,
            _ => {
                warn!(weather_kind, "no stickers for weather type");
                &self.undefined_weather_stickers
            }
        };
        pool.choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(&self.maintenance_sticker)
    }

    /// Shown together with the apology message when a handler fails.
    pub fn maintenance(&self) -> &str {
        &self.maintenance_sticker
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn sample() -> StickerSet {
        serde_json::from_value(json!({
            "maintenanceSticker": "maint",
            "undefinedWeatherStickers": ["undef-1", "undef-2"],
            "weatherTypes": {
                "Clear": ["clear-1"],
                "Rain": ["rain-1", "rain-2"],
                "Haze": []
            }
        }))
        .unwrap()
    }

    #[test]
    fn known_weather_type_picks_from_its_pool() {
        let stickers = sample();
        assert_eq!(stickers.for_weather("Clear"), "clear-1");
        assert!(stickers.for_weather("Rain").starts_with("rain-"));
    }

    #[test]
    fn unknown_or_empty_type_falls_back_to_undefined_pool() {
        let stickers = sample();
        assert!(stickers.for_weather("Tornado").starts_with("undef-"));
        assert!(stickers.for_weather("Haze").starts_with("undef-"));
    }

    #[test]
    fn maintenance_sticker_is_exposed() {
        assert_eq!(sample().maintenance(), "maint");
    }
}
