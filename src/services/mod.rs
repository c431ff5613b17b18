pub mod forecast;
pub mod health;
pub mod mailing;
pub mod schedule;
pub mod stickers;
pub mod weather;
