//! The mailing time sequence: a pure, restartable stream of delivery
//! instants. Separating "what are the boundaries" from "when do we wake up"
//! keeps the boundary arithmetic testable without real sleeping.

use chrono::{DateTime, Duration, TimeZone, Timelike};

/// An infinite, strictly increasing sequence of mailing instants.
///
/// The first produced instant is `start + interval`, each subsequent one is
/// the previous plus `interval`. The sequence is purely a function of its
/// inputs: it never reads the clock, so restarting it from the same `start`
/// reproduces the same values. Callers who want the instants aligned to the
/// interval grid must round `start` down with [`align_to_grid`] first.
pub struct MailingSchedule<Tz: TimeZone> {
    cursor: DateTime<Tz>,
    interval: Duration,
}

impl<Tz: TimeZone> MailingSchedule<Tz> {
    pub fn new(start: DateTime<Tz>, interval: Duration) -> Self {
        Self {
            cursor: start,
            interval,
        }
    }
}

impl<Tz: TimeZone> Iterator for MailingSchedule<Tz> {
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor = self.cursor.clone() + self.interval;
        Some(self.cursor.clone())
    }
}

/// Rounds `instant` down to the nearest interval boundary within the hour.
///
/// `07:37:21, 15m -> 07:30:00`. An instant already on the grid is unchanged.
pub fn align_to_grid<Tz: TimeZone>(instant: DateTime<Tz>, interval: Duration) -> DateTime<Tz> {
    let step = interval.num_minutes().clamp(1, 60) as u32;
    instant
        .clone()
        .with_minute(instant.minute() - instant.minute() % step)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}
