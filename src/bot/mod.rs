pub mod commands;
pub mod handlers;
pub mod keyboards;
pub mod templates;
