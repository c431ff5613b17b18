use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A mailing subscriber: at most one record per Telegram user.
///
/// The time of day is stored as minutes since midnight so the lookup at a
/// mailing instant is a single integer comparison.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: i64,
    pub mailing_minutes: i64,
}

impl Subscriber {
    pub fn mailing_time(&self) -> NaiveTime {
        minutes_to_time(self.mailing_minutes)
    }

    /// Registers a subscriber, overwriting the mailing time if the user is
    /// already registered. Keeps the one-record-per-user invariant without a
    /// separate existence check.
    pub async fn upsert(
        pool: &sqlx::SqlitePool,
        id: i64,
        mailing_time: NaiveTime,
    ) -> Result<Self, sqlx::Error> {
        let minutes = time_to_minutes(mailing_time);

        sqlx::query(
            "INSERT INTO subscribers (id, mailing_minutes) VALUES (?, ?)
             ON CONFLICT (id) DO UPDATE SET mailing_minutes = excluded.mailing_minutes",
        )
        .bind(id)
        .bind(minutes)
        .execute(pool)
        .await?;

        Ok(Subscriber {
            id,
            mailing_minutes: minutes,
        })
    }

    pub async fn find(pool: &sqlx::SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscriber>(
            "SELECT id, mailing_minutes FROM subscribers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a subscriber. Deleting an absent id is not an error, which
    /// tolerates races between a user unsubscribing and a slow mailing pass.
    pub async fn delete(pool: &sqlx::SqlitePool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM subscribers WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// All subscribers whose mailing time matches the given time of day.
    pub async fn due_at(
        pool: &sqlx::SqlitePool,
        mailing_time: NaiveTime,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscriber>(
            "SELECT id, mailing_minutes FROM subscribers WHERE mailing_minutes = ? ORDER BY id",
        )
        .bind(time_to_minutes(mailing_time))
        .fetch_all(pool)
        .await
    }
}

pub fn time_to_minutes(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

pub fn minutes_to_time(minutes: i64) -> NaiveTime {
    let hour = (minutes / 60).rem_euclid(24) as u32;
    let minute = minutes.rem_euclid(60) as u32;
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}
