//! Mailing subscription flows: subscribe, change time, cancel, info.

use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};

use crate::bot::handlers::{BotDialogue, HandlerResult, State};
use crate::bot::keyboards;
use crate::bot::templates;
use crate::database::connection::DatabaseManager;
use crate::database::models::Subscriber;

/// Tells the user their mailing time, or how to subscribe if they have none.
pub async fn handle_mailing_info(
    bot: &Bot,
    msg: &Message,
    db: &Arc<DatabaseManager>,
) -> HandlerResult {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let text = match Subscriber::find(&db.pool, user.id.0 as i64).await {
        Ok(Some(subscriber)) => templates::user_in_mailing(subscriber.mailing_time()),
        Ok(None) => templates::USER_NOT_IN_MAILING.to_string(),
        Err(err) => {
            error!("failed to look up subscriber {}: {err:#}", user.id);
            templates::MAINTENANCE_MESSAGE.to_string()
        }
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Starts the hour/minute picker flow for a new subscription.
pub async fn handle_subscribe(bot: &Bot, msg: &Message, dialogue: &BotDialogue) -> HandlerResult {
    dialogue
        .update(State::ChoosingMailingHour { change: false })
        .await?;
    bot.send_message(msg.chat.id, templates::CHOOSE_HOUR)
        .reply_markup(keyboards::hour_choice())
        .await?;
    Ok(())
}

/// Starts the hour/minute picker flow for changing an existing subscription.
pub async fn handle_change_time(bot: &Bot, msg: &Message, dialogue: &BotDialogue) -> HandlerResult {
    dialogue
        .update(State::ChoosingMailingHour { change: true })
        .await?;
    bot.send_message(msg.chat.id, templates::CHOOSE_HOUR)
        .reply_markup(keyboards::hour_choice())
        .await?;
    Ok(())
}

/// Removes the subscription. Removal is idempotent, so cancelling twice (or
/// racing with a mailing-pass deregistration) is harmless.
pub async fn handle_cancel(bot: &Bot, msg: &Message, db: &Arc<DatabaseManager>) -> HandlerResult {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;

    match Subscriber::delete(&db.pool, user_id).await {
        Ok(()) => {
            bot.send_message(msg.chat.id, templates::USER_UNSUBSCRIBED)
                .await?;
            info!(user_id, "subscriber cancelled the mailing");
        }
        Err(err) => {
            error!("failed to delete subscriber {user_id}: {err:#}");
            bot.send_message(msg.chat.id, templates::MAINTENANCE_MESSAGE)
                .await?;
        }
    }
    Ok(())
}
