pub mod callback;
pub mod message;

use std::sync::Arc;
use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        UpdateHandler,
    },
    prelude::*,
    types::InputFile,
};

use crate::bot::commands::Command;
use crate::bot::templates;
use crate::services::stickers::StickerSet;

/// Per-chat conversation state: which picker, if any, the user is inside.
#[derive(Clone, Default, Debug)]
pub enum State {
    #[default]
    Idle,
    ChoosingForecastHour,
    ChoosingForecastDay,
    ChoosingMailingHour {
        /// Whether this flow changes an existing subscription rather than
        /// creating one; only the confirmation text differs.
        change: bool,
    },
    ChoosingMailingMinute {
        change: bool,
        hour: u32,
    },
}

pub type BotDialogue = Dialogue<State, InMemStorage<State>>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub struct BotHandler;

impl BotHandler {
    pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
        dialogue::enter::<Update, InMemStorage<State>, State, _>()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(message::command_handler),
            )
            .branch(Update::filter_message().endpoint(message::keyboard_handler))
            .branch(Update::filter_callback_query().endpoint(callback::callback_handler))
    }
}

/// Apology reply for unexpected failures: maintenance sticker plus text.
pub async fn send_maintenance(
    bot: &Bot,
    chat_id: ChatId,
    stickers: &Arc<StickerSet>,
) -> HandlerResult {
    bot.send_sticker(chat_id, InputFile::file_id(stickers.maintenance().to_owned()))
        .await?;
    bot.send_message(chat_id, templates::MAINTENANCE_MESSAGE)
        .await?;
    Ok(())
}
