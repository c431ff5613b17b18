//! Forecast values rendered for users.
//!
//! A forecast couples one weather entry with the active alerts; `format`
//! produces the message text and `weather_kind` drives sticker selection.

use crate::services::weather::response::{Alert, DailyWeather, Weather};

/// Weather at a single moment: the current weather or one hourly entry.
#[derive(Debug, Clone)]
pub struct MomentForecast {
    pub weather: Weather,
    pub alerts: Vec<Alert>,
}

impl MomentForecast {
    pub fn format(&self) -> String {
        let mut text = format!(
            "{}\n\n\
             Температура: {:+.2}°\n\
             Ощущается как: {:+.2}°\n\n\
             {}\n\
             Влажность: {}%\n\
             Облачность: {}%",
            description_line(&self.weather.descriptions),
            self.weather.temp,
            self.weather.feels_like,
            wind_line(self.weather.wind_speed, self.weather.wind_gust),
            self.weather.humidity,
            self.weather.cloudiness,
        );
        text.push_str(&format_alerts(&self.alerts));
        text
    }

    pub fn weather_kind(&self) -> &str {
        weather_kind(&self.weather.descriptions)
    }
}

/// Weather for a whole day, with per-day-part temperatures.
#[derive(Debug, Clone)]
pub struct DailyForecast {
    pub weather: DailyWeather,
    pub alerts: Vec<Alert>,
}

impl DailyForecast {
    pub fn format(&self) -> String {
        let temp = &self.weather.temp;
        let feels = &self.weather.feels_like;
        let mut text = format!(
            "{}\n\n\
             Утром: {:+.2}° (ощущается как {:+.2}°)\n\
             Днём: {:+.2}° (ощущается как {:+.2}°)\n\
             Вечером: {:+.2}° (ощущается как {:+.2}°)\n\
             Ночью: {:+.2}° (ощущается как {:+.2}°)\n\n\
             Минимальная температура: {:+.2}°, максимальная: {:+.2}°\n\n\
             {}\n\
             Влажность: {}%\n\
             Облачность: {}%",
            description_line(&self.weather.descriptions),
            temp.morning,
            feels.morning,
            temp.day,
            feels.day,
            temp.evening,
            feels.evening,
            temp.night,
            feels.night,
            temp.min,
            temp.max,
            wind_line(self.weather.wind_speed, self.weather.wind_gust),
            self.weather.humidity,
            self.weather.cloudiness,
        );
        text.push_str(&format_alerts(&self.alerts));
        text
    }

    pub fn weather_kind(&self) -> &str {
        weather_kind(&self.weather.descriptions)
    }
}

fn weather_kind(descriptions: &[crate::services::weather::response::WeatherDescription]) -> &str {
    descriptions.first().map(|d| d.main.as_str()).unwrap_or("")
}

fn description_line(
    descriptions: &[crate::services::weather::response::WeatherDescription],
) -> String {
    descriptions
        .first()
        .map(|d| capitalize(&d.description))
        .unwrap_or_default()
}

fn wind_line(speed: f64, gust: Option<f64>) -> String {
    match gust {
        Some(gust) => format!("Ветер: {speed} м/с (порывы до {gust} м/с)"),
        None => format!("Ветер: {speed} м/с"),
    }
}

fn format_alerts(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return String::new();
    }

    let lines: Vec<String> = alerts
        .iter()
        .map(|alert| format!("⚠ {} ({})", alert.event, alert.description))
        .collect();
    format!("\n\n{}", lines.join("\n"))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_handles_cyrillic() {
        assert_eq!(capitalize("облачно с прояснениями"), "Облачно с прояснениями");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn wind_line_mentions_gusts_only_when_present() {
        assert_eq!(wind_line(6.0, None), "Ветер: 6 м/с");
        assert_eq!(
            wind_line(6.0, Some(10.2)),
            "Ветер: 6 м/с (порывы до 10.2 м/с)"
        );
    }

    #[test]
    fn alerts_join_into_trailing_block() {
        let alerts = vec![
            Alert {
                event: "Ветер".to_string(),
                description: "местами порывы 15-20 м/с".to_string(),
            },
            Alert {
                event: "Гроза".to_string(),
                description: "вечером".to_string(),
            },
        ];
        assert_eq!(
            format_alerts(&alerts),
            "\n\n⚠ Ветер (местами порывы 15-20 м/с)\n⚠ Гроза (вечером)"
        );
        assert_eq!(format_alerts(&[]), "");
    }
}
