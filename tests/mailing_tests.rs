#![allow(clippy::unwrap_used)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use che_weather_bot::database::models::{time_to_minutes, Subscriber};
use che_weather_bot::services::forecast::MomentForecast;
use che_weather_bot::services::mailing::{
    DeliveryError, ForecastSource, MailingService, Notifier, PassSummary, SubscriberDirectory,
};
use che_weather_bot::services::stickers::StickerSet;
use che_weather_bot::services::weather::response::{Weather, WeatherDescription};
use che_weather_bot::utils::datetime::CHE_TZ;
use chrono::{Duration, NaiveTime, TimeZone, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn subscriber(id: i64, at: NaiveTime) -> Subscriber {
    Subscriber {
        id,
        mailing_minutes: time_to_minutes(at),
    }
}

fn test_stickers() -> Arc<StickerSet> {
    Arc::new(
        serde_json::from_value(json!({
            "maintenanceSticker": "maint",
            "undefinedWeatherStickers": ["undef"],
            "weatherTypes": { "Clouds": ["clouds-sticker"] }
        }))
        .unwrap(),
    )
}

struct FakeDirectory {
    subscribers: Mutex<Vec<Subscriber>>,
    removed: Mutex<Vec<i64>>,
}

impl FakeDirectory {
    fn with(subscribers: Vec<Subscriber>) -> Arc<Self> {
        Arc::new(Self {
            subscribers: Mutex::new(subscribers),
            removed: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SubscriberDirectory for FakeDirectory {
    async fn due_at(&self, mailing_time: NaiveTime) -> Result<Vec<Subscriber>> {
        let minutes = time_to_minutes(mailing_time);
        Ok(self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.mailing_minutes == minutes)
            .cloned()
            .collect())
    }

    async fn remove(&self, user_id: i64) -> Result<()> {
        self.subscribers.lock().unwrap().retain(|s| s.id != user_id);
        self.removed.lock().unwrap().push(user_id);
        Ok(())
    }
}

struct FakeForecasts {
    fail: bool,
    fetches: AtomicUsize,
}

impl FakeForecasts {
    fn working() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            fetches: AtomicUsize::new(0),
        })
    }

    fn broken() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ForecastSource for FakeForecasts {
    async fn current(&self) -> Result<MomentForecast> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("weather provider is down"));
        }
        Ok(MomentForecast {
            weather: Weather {
                timestamp: Utc.with_ymd_and_hms(2024, 4, 15, 7, 45, 0).unwrap(),
                humidity: 60,
                cloudiness: 20,
                wind_speed: 4.0,
                wind_gust: None,
                descriptions: vec![WeatherDescription {
                    main: "Clouds".to_string(),
                    description: "облачно с прояснениями".to_string(),
                }],
                temp: 10.0,
                feels_like: 8.5,
            },
            alerts: Vec::new(),
        })
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Deliver,
    Transient,
    Forbidden,
}

struct ScriptedNotifier {
    outcomes: HashMap<i64, Outcome>,
    attempts: Mutex<Vec<i64>>,
    texts: Mutex<Vec<String>>,
}

impl ScriptedNotifier {
    fn with(outcomes: impl IntoIterator<Item = (i64, Outcome)>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: outcomes.into_iter().collect(),
            attempts: Mutex::new(Vec::new()),
            texts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    async fn notify(&self, user_id: i64, text: &str, _sticker: &str) -> Result<(), DeliveryError> {
        self.attempts.lock().unwrap().push(user_id);
        self.texts.lock().unwrap().push(text.to_string());
        match self.outcomes.get(&user_id).copied().unwrap_or(Outcome::Deliver) {
            Outcome::Deliver => Ok(()),
            Outcome::Transient => Err(DeliveryError::Transient(anyhow!("flood limit"))),
            Outcome::Forbidden => Err(DeliveryError::Forbidden),
        }
    }
}

#[tokio::test]
async fn one_failing_delivery_does_not_stop_the_pass() {
    let directory = FakeDirectory::with(vec![
        subscriber(1, time(7, 45)),
        subscriber(2, time(7, 45)),
    ]);
    let notifier = ScriptedNotifier::with([(1, Outcome::Transient), (2, Outcome::Deliver)]);
    let service = MailingService::new(
        Arc::clone(&directory),
        FakeForecasts::working(),
        Arc::clone(&notifier),
        test_stickers(),
    );

    let summary = service.run_pass(time(7, 45)).await.unwrap();

    assert_eq!(
        summary,
        PassSummary {
            delivered: 1,
            failed: 1,
            removed: 0
        }
    );
    // Both subscribers were attempted despite the first failing
    assert_eq!(*notifier.attempts.lock().unwrap(), vec![1, 2]);
    // Nobody was deregistered for a transient failure
    assert!(directory.removed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blocked_subscriber_is_deregistered() {
    let directory = FakeDirectory::with(vec![
        subscriber(1, time(7, 45)),
        subscriber(2, time(7, 45)),
    ]);
    let notifier = ScriptedNotifier::with([(1, Outcome::Forbidden)]);
    let service = MailingService::new(
        Arc::clone(&directory),
        FakeForecasts::working(),
        notifier,
        test_stickers(),
    );

    let summary = service.run_pass(time(7, 45)).await.unwrap();

    assert_eq!(
        summary,
        PassSummary {
            delivered: 1,
            failed: 0,
            removed: 1
        }
    );
    assert_eq!(*directory.removed.lock().unwrap(), vec![1]);
    // The record really is gone
    assert!(directory.due_at(time(7, 45)).await.unwrap().iter().all(|s| s.id != 1));
}

#[tokio::test]
async fn forecast_failure_abandons_the_pass_without_deliveries() {
    let directory = FakeDirectory::with(vec![
        subscriber(1, time(7, 45)),
        subscriber(2, time(7, 45)),
    ]);
    let notifier = ScriptedNotifier::with([]);
    let service = MailingService::new(
        Arc::clone(&directory),
        FakeForecasts::broken(),
        Arc::clone(&notifier),
        test_stickers(),
    );

    let result = service.run_pass(time(7, 45)).await;

    assert!(result.is_err());
    assert!(notifier.attempts.lock().unwrap().is_empty());
    // Subscribers stay registered for the next window
    assert_eq!(directory.due_at(time(7, 45)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn empty_due_set_is_a_no_op_pass() {
    let directory = FakeDirectory::with(vec![subscriber(1, time(8, 0))]);
    let forecasts = FakeForecasts::working();
    let notifier = ScriptedNotifier::with([]);
    let service = MailingService::new(
        directory,
        Arc::clone(&forecasts),
        Arc::clone(&notifier),
        test_stickers(),
    );

    let summary = service.run_pass(time(7, 45)).await.unwrap();

    assert_eq!(summary, PassSummary::default());
    assert!(notifier.attempts.lock().unwrap().is_empty());
    // No forecast is fetched when nobody is due
    assert_eq!(forecasts.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn only_subscribers_of_the_target_time_are_mailed() {
    let directory = FakeDirectory::with(vec![
        subscriber(1, time(7, 45)),
        subscriber(2, time(8, 0)),
    ]);
    let notifier = ScriptedNotifier::with([]);
    let service = MailingService::new(
        directory,
        FakeForecasts::working(),
        Arc::clone(&notifier),
        test_stickers(),
    );

    service.run_pass(time(7, 45)).await.unwrap();

    assert_eq!(*notifier.attempts.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn mailing_text_is_rendered_once_and_shared() {
    let directory = FakeDirectory::with(vec![
        subscriber(1, time(7, 45)),
        subscriber(2, time(7, 45)),
    ]);
    let notifier = ScriptedNotifier::with([]);
    let service = MailingService::new(
        directory,
        FakeForecasts::working(),
        Arc::clone(&notifier),
        test_stickers(),
    );

    service.run_pass(time(7, 45)).await.unwrap();

    let texts = notifier.texts.lock().unwrap();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], texts[1]);
    assert!(texts[0].starts_with("Ваш ежедневный прогноз"));
    assert!(texts[0].contains("Облачно с прояснениями"));
}

async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn past_target_fires_immediately_without_sleeping() {
    // The clock is half a minute past the 07:45 target, so the loop's first
    // sleep clamps to zero instead of going negative or skipping the pass.
    let now = CHE_TZ.with_ymd_and_hms(2024, 4, 15, 7, 45, 30).unwrap();
    let start = CHE_TZ.with_ymd_and_hms(2024, 4, 15, 7, 30, 0).unwrap();

    let directory = FakeDirectory::with(vec![subscriber(1, time(7, 45))]);
    let notifier = ScriptedNotifier::with([]);
    let service = MailingService::with_clock(
        directory,
        FakeForecasts::working(),
        Arc::clone(&notifier),
        test_stickers(),
        Box::new(move || now),
    );

    let task = tokio::spawn(async move { service.run(start, Duration::minutes(15)).await });

    wait_until(|| !notifier.attempts.lock().unwrap().is_empty()).await;
    task.abort();

    assert_eq!(*notifier.attempts.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn next_pass_still_fires_after_an_abandoned_pass() {
    // Both the 07:45 and 08:00 targets are already due. The 07:45 pass is
    // abandoned by the broken forecast source; the 08:00 pass must still run.
    let now = CHE_TZ.with_ymd_and_hms(2024, 4, 15, 8, 0, 30).unwrap();
    let start = CHE_TZ.with_ymd_and_hms(2024, 4, 15, 7, 30, 0).unwrap();

    let directory = FakeDirectory::with(vec![
        subscriber(1, time(7, 45)),
        subscriber(2, time(8, 0)),
    ]);
    let forecasts = FakeForecasts::broken();
    let notifier = ScriptedNotifier::with([]);
    let service = MailingService::with_clock(
        directory,
        Arc::clone(&forecasts),
        Arc::clone(&notifier),
        test_stickers(),
        Box::new(move || now),
    );

    let task = tokio::spawn(async move { service.run(start, Duration::minutes(15)).await });

    wait_until(|| forecasts.fetches.load(Ordering::SeqCst) >= 2).await;
    task.abort();

    // Each due pass got as far as its forecast fetch; nobody was mailed.
    assert!(notifier.attempts.lock().unwrap().is_empty());
}
