//! # Cherepovets Weather Bot
//!
//! A Telegram bot reporting weather for Cherepovets (OpenWeatherMap One Call
//! API, civil timezone Europe/Moscow) with a recurring forecast mailing.
//!
//! ## Features
//! - Current weather, next-hour, exact-hour, tomorrow and exact-day forecasts
//! - Weather-type stickers attached to every forecast
//! - Quarter-hour mailing: subscribers pick a time of day and receive the
//!   forecast at that time, pinned in their chat
//! - Persistent subscriber storage with SQLite

/// Bot command handlers, keyboards and message templates
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Background services: the mailing scheduler, weather client, stickers
pub mod services;
/// Utility functions for civil datetime arithmetic
pub mod utils;
