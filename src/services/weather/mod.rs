//! OpenWeatherMap client with a time-bucketed, single-flight cache.
//!
//! The bot serves one fixed location, so one cached response covers every
//! caller. The cache key is the current time bucket: repeated calls within a
//! bucket return the same snapshot, and concurrent callers on a cache miss
//! share one in-flight request instead of racing duplicate fetches.

pub mod response;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::services::forecast::{DailyForecast, MomentForecast};
use crate::utils::datetime::CHE_TZ;
use response::{DailyWeather, Weather, WeatherResponse};

/// Cherepovets coordinates.
pub const CHE_LAT: f64 = 59.09;
pub const CHE_LON: f64 = 37.91;

/// Cache bucket width in seconds.
pub const DEFAULT_CACHE_SECS: i64 = 300;

/// The raw fetch seam, separated from caching so tests can count requests.
#[async_trait]
pub trait FetchWeather: Send + Sync {
    async fn fetch(&self) -> Result<WeatherResponse>;
}

#[async_trait]
impl<T: FetchWeather + ?Sized> FetchWeather for Arc<T> {
    async fn fetch(&self) -> Result<WeatherResponse> {
        (**self).fetch().await
    }
}

/// OpenWeatherMap One Call API client for a fixed set of coordinates.
pub struct OwmClient {
    http: reqwest::Client,
    url: reqwest::Url,
}

impl OwmClient {
    pub fn for_che(api_key: &str) -> Result<Self> {
        Self::from_geo(CHE_LAT, CHE_LON, api_key)
    }

    pub fn from_geo(lat: f64, lon: f64, api_key: &str) -> Result<Self> {
        let url = reqwest::Url::parse_with_params(
            "https://api.openweathermap.org/data/2.5/onecall",
            &[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
                ("exclude", "minutely".to_string()),
                ("lang", "ru".to_string()),
            ],
        )?;

        Ok(Self {
            http: reqwest::Client::new(),
            url,
        })
    }
}

#[async_trait]
impl FetchWeather for OwmClient {
    async fn fetch(&self) -> Result<WeatherResponse> {
        let mut weather: WeatherResponse = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .context("weather request failed")?
            .error_for_status()
            .context("weather provider returned an error status")?
            .json()
            .await
            .context("malformed weather payload")?;

        weather.retain_russian_alerts();
        Ok(weather)
    }
}

/// Injectable time source for the cache, so tests can steer buckets.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A weather source caching one response per time bucket.
pub struct CachedWeather<F = OwmClient> {
    fetcher: F,
    bucket_secs: i64,
    clock: Clock,
    slot: Mutex<Option<(i64, Arc<WeatherResponse>)>>,
}

/// The cache shared between chat handlers and the mailing scheduler.
pub type SharedWeather = Arc<CachedWeather<OwmClient>>;

impl<F: FetchWeather> CachedWeather<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_clock(fetcher, DEFAULT_CACHE_SECS, Box::new(Utc::now))
    }

    /// Cache with an injectable clock, for tests.
    pub fn with_clock(fetcher: F, bucket_secs: i64, clock: Clock) -> Self {
        Self {
            fetcher,
            bucket_secs: bucket_secs.max(1),
            clock,
            slot: Mutex::new(None),
        }
    }

    /// The cached response for the current bucket, fetching on miss.
    ///
    /// The slot lock is held across the fetch, which is what makes concurrent
    /// misses single-flight: the second caller blocks until the first has
    /// populated the bucket, then reads it.
    async fn response(&self) -> Result<Arc<WeatherResponse>> {
        let bucket = (self.clock)().timestamp().div_euclid(self.bucket_secs);
        let mut slot = self.slot.lock().await;

        if let Some((cached_bucket, cached)) = slot.as_ref() {
            if *cached_bucket == bucket {
                return Ok(Arc::clone(cached));
            }
        }

        debug!(bucket, "weather cache miss");
        let fresh = Arc::new(self.fetcher.fetch().await?);
        *slot = Some((bucket, Arc::clone(&fresh)));
        Ok(fresh)
    }

    /// Current weather.
    pub async fn current(&self) -> Result<MomentForecast> {
        let weather = self.response().await?;
        Ok(MomentForecast {
            weather: weather.current.clone(),
            alerts: weather.alerts.clone(),
        })
    }

    /// The earliest hourly forecast strictly after `after`.
    pub async fn hourly(&self, after: DateTime<Utc>) -> Result<MomentForecast> {
        let weather = self.response().await?;
        let entry = next_hourly_after(&weather.hourly, after)?;
        Ok(MomentForecast {
            weather: entry.clone(),
            alerts: weather.alerts.clone(),
        })
    }

    /// The hourly forecast whose timestamp equals `timestamp` (unix seconds).
    pub async fn exact_hour(&self, timestamp: i64) -> Result<MomentForecast> {
        let weather = self.response().await?;
        let entry = weather
            .hourly
            .iter()
            .find(|w| w.timestamp.timestamp() == timestamp)
            .ok_or_else(|| anyhow!("no hourly forecast at timestamp {timestamp}"))?;
        Ok(MomentForecast {
            weather: entry.clone(),
            alerts: weather.alerts.clone(),
        })
    }

    /// The earliest daily forecast strictly after `after`.
    pub async fn daily(&self, after: DateTime<Utc>) -> Result<DailyForecast> {
        let weather = self.response().await?;
        let entry = next_daily_after(&weather.daily, after)?;
        Ok(DailyForecast {
            weather: entry.clone(),
            alerts: weather.alerts.clone(),
        })
    }

    /// The daily forecast for the given civil date.
    pub async fn exact_day(&self, day: NaiveDate) -> Result<DailyForecast> {
        let weather = self.response().await?;
        let entry = weather
            .daily
            .iter()
            .find(|w| w.timestamp.with_timezone(&CHE_TZ).date_naive() == day)
            .ok_or_else(|| anyhow!("no daily forecast for {day}"))?;
        Ok(DailyForecast {
            weather: entry.clone(),
            alerts: weather.alerts.clone(),
        })
    }
}

fn next_hourly_after(forecasts: &[Weather], after: DateTime<Utc>) -> Result<&Weather> {
    forecasts
        .iter()
        .filter(|w| w.timestamp > after)
        .min_by_key(|w| w.timestamp)
        .ok_or_else(|| anyhow!("no hourly forecast after {after}"))
}

fn next_daily_after(forecasts: &[DailyWeather], after: DateTime<Utc>) -> Result<&DailyWeather> {
    forecasts
        .iter()
        .filter(|w| w.timestamp > after)
        .min_by_key(|w| w.timestamp)
        .ok_or_else(|| anyhow!("no daily forecast after {after}"))
}
