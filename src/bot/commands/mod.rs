pub mod forecast;
pub mod mailing;

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "Команды бота:")]
pub enum Command {
    #[command(description = "выдать клавиатуру и описание команд")]
    Start,
    #[command(description = "показать справку")]
    Help,
    #[command(description = "подписаться на ежедневную рассылку прогноза")]
    SubscribeToMailing,
    #[command(description = "поменять время рассылки")]
    ChangeTimeMailing,
    #[command(description = "отказаться от рассылки")]
    CancelMailing,
}
