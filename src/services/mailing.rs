//! The recurring forecast mailing.
//!
//! One long-lived task wakes at every interval boundary, looks up the
//! subscribers due at that time of day, fetches a (cached) forecast, renders
//! the message once and delivers it to each subscriber. A failed delivery
//! never aborts the rest of the pass, and a failed forecast fetch abandons
//! the pass but keeps the loop alive.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime};
use chrono_tz::Tz;
use std::fmt;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use teloxide::{ApiError, RequestError};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::database::connection::DatabaseManager;
use crate::database::models::Subscriber;
use crate::services::forecast::MomentForecast;
use crate::services::schedule::MailingSchedule;
use crate::services::stickers::StickerSet;
use crate::services::weather::{CachedWeather, FetchWeather};
use crate::utils::datetime::che_now;

/// Why a single delivery failed.
#[derive(Debug)]
pub enum DeliveryError {
    /// The recipient blocked the bot or the chat is gone; the subscription
    /// is dead and should be removed.
    Forbidden,
    /// A transient transport failure; the subscriber simply gets their
    /// forecast at the next window.
    Transient(anyhow::Error),
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Forbidden => write!(f, "recipient is unreachable"),
            DeliveryError::Transient(err) => write!(f, "transient delivery failure: {err:#}"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Read/remove access to the subscriber store, as the scheduler needs it.
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    async fn due_at(&self, mailing_time: NaiveTime) -> Result<Vec<Subscriber>>;
    /// Idempotent: removing an absent subscriber is not an error.
    async fn remove(&self, user_id: i64) -> Result<()>;
}

/// The forecast snapshot the scheduler renders from.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn current(&self) -> Result<MomentForecast>;
}

/// Delivery of one rendered mailing to one subscriber.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: i64, text: &str, sticker: &str) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: SubscriberDirectory> SubscriberDirectory for Arc<T> {
    async fn due_at(&self, mailing_time: NaiveTime) -> Result<Vec<Subscriber>> {
        SubscriberDirectory::due_at(&**self, mailing_time).await
    }

    async fn remove(&self, user_id: i64) -> Result<()> {
        SubscriberDirectory::remove(&**self, user_id).await
    }
}

#[async_trait]
impl<T: ForecastSource> ForecastSource for Arc<T> {
    async fn current(&self) -> Result<MomentForecast> {
        ForecastSource::current(&**self).await
    }
}

#[async_trait]
impl<T: Notifier> Notifier for Arc<T> {
    async fn notify(&self, user_id: i64, text: &str, sticker: &str) -> Result<(), DeliveryError> {
        Notifier::notify(&**self, user_id, text, sticker).await
    }
}

#[async_trait]
impl SubscriberDirectory for DatabaseManager {
    async fn due_at(&self, mailing_time: NaiveTime) -> Result<Vec<Subscriber>> {
        Ok(Subscriber::due_at(&self.pool, mailing_time).await?)
    }

    async fn remove(&self, user_id: i64) -> Result<()> {
        Subscriber::delete(&self.pool, user_id).await?;
        Ok(())
    }
}

#[async_trait]
impl<F: FetchWeather> ForecastSource for CachedWeather<F> {
    async fn current(&self) -> Result<MomentForecast> {
        CachedWeather::current(self).await
    }
}

/// Sends the mailing over Telegram: sticker, then the forecast text, then
/// "unpin all previous forecasts, pin the new one".
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, user_id: i64, text: &str, sticker: &str) -> Result<(), DeliveryError> {
        let chat_id = ChatId(user_id);

        self.bot
            .send_sticker(chat_id, InputFile::file_id(sticker.to_owned()))
            .await
            .map_err(classify_send_error)?;
        let message = self
            .bot
            .send_message(chat_id, text)
            .await
            .map_err(classify_send_error)?;
        self.bot
            .unpin_all_chat_messages(chat_id)
            .await
            .map_err(classify_send_error)?;
        self.bot
            .pin_chat_message(chat_id, message.id)
            .disable_notification(true)
            .await
            .map_err(classify_send_error)?;

        Ok(())
    }
}

fn classify_send_error(err: RequestError) -> DeliveryError {
    match err {
        RequestError::Api(
            ApiError::BotBlocked | ApiError::UserDeactivated | ApiError::ChatNotFound,
        ) => DeliveryError::Forbidden,
        other => DeliveryError::Transient(other.into()),
    }
}

/// Outcome counts of one mailing pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub delivered: usize,
    pub failed: usize,
    pub removed: usize,
}

impl PassSummary {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed + self.removed
    }
}

const MAILING_PREFIX: &str = "Ваш ежедневный прогноз 😊\n\n";

/// Injectable time source for the delivery loop, so tests can place targets
/// in the past.
pub type SchedulerClock = Box<dyn Fn() -> DateTime<Tz> + Send + Sync>;

/// The mailing scheduler. Holds only injected collaborators; all state that
/// outlives a pass lives in the subscriber store and the weather cache.
pub struct MailingService<D, F, N> {
    directory: D,
    forecasts: F,
    notifier: N,
    stickers: Arc<StickerSet>,
    clock: SchedulerClock,
}

impl<D, F, N> MailingService<D, F, N>
where
    D: SubscriberDirectory,
    F: ForecastSource,
    N: Notifier,
{
    pub fn new(directory: D, forecasts: F, notifier: N, stickers: Arc<StickerSet>) -> Self {
        Self::with_clock(directory, forecasts, notifier, stickers, Box::new(che_now))
    }

    /// Scheduler with an injectable clock, for tests.
    pub fn with_clock(
        directory: D,
        forecasts: F,
        notifier: N,
        stickers: Arc<StickerSet>,
        clock: SchedulerClock,
    ) -> Self {
        Self {
            directory,
            forecasts,
            notifier,
            stickers,
            clock,
        }
    }

    /// Drives the delivery loop forever.
    ///
    /// `start` must already be aligned to the interval grid (see
    /// [`crate::services::schedule::align_to_grid`]). Passes are strictly
    /// sequential: if a pass overruns its window, the next target's sleep
    /// clamps to zero and the pass fires immediately instead of being
    /// skipped or doubled.
    pub async fn run(&self, start: DateTime<Tz>, interval: Duration) {
        info!(%start, interval_minutes = interval.num_minutes(), "mailing scheduler started");

        for target in MailingSchedule::new(start, interval) {
            // A target at or before "now" clamps to a zero sleep and fires
            // immediately; it is never skipped.
            let wait = target
                .signed_duration_since((self.clock)())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);
            sleep(wait).await;

            match self.run_pass(target.time()).await {
                Ok(summary) if summary.attempted() > 0 => info!(
                    mailing_time = %target.time(),
                    delivered = summary.delivered,
                    failed = summary.failed,
                    removed = summary.removed,
                    "mailing pass finished"
                ),
                Ok(_) => debug!(mailing_time = %target.time(), "no subscribers due"),
                Err(err) => error!(
                    mailing_time = %target.time(),
                    "mailing pass abandoned: {err:#}"
                ),
            }
        }
    }

    /// One mailing pass for the given time of day.
    ///
    /// Returns an error only when the whole pass had to be abandoned (the
    /// subscriber lookup or the forecast fetch failed); per-subscriber
    /// failures are classified and absorbed here.
    pub async fn run_pass(&self, mailing_time: NaiveTime) -> Result<PassSummary> {
        let due = self.directory.due_at(mailing_time).await?;
        if due.is_empty() {
            return Ok(PassSummary::default());
        }

        let forecast = self.forecasts.current().await?;
        // Rendered once; every subscriber in the pass gets the same content.
        let text = format!("{MAILING_PREFIX}{}", forecast.format());
        let sticker = self.stickers.for_weather(forecast.weather_kind()).to_owned();

        let mut summary = PassSummary::default();
        for subscriber in due {
            match self.notifier.notify(subscriber.id, &text, &sticker).await {
                Ok(()) => {
                    info!(user_id = subscriber.id, "subscriber received the scheduled forecast");
                    summary.delivered += 1;
                }
                Err(DeliveryError::Forbidden) => {
                    if let Err(err) = self.directory.remove(subscriber.id).await {
                        warn!(user_id = subscriber.id, "failed to deregister: {err:#}");
                    } else {
                        info!(
                            user_id = subscriber.id,
                            "subscriber removed from the mailing: bot is blocked"
                        );
                    }
                    summary.removed += 1;
                }
                Err(DeliveryError::Transient(err)) => {
                    warn!(user_id = subscriber.id, "delivery failed: {err:#}");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
