//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

use super::context::{BotContext, Incoming};
use super::message_handler::send_reply;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, ctx: Arc<BotContext>) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Answer the callback query to remove the loading state
    bot.answer_callback_query(q.id.clone()).await?;

    let chat_id = match &q.message {
        Some(message) => message.chat().id,
        None => {
            debug!(user_id = %q.from.id, "Callback query without a message, ignoring");
            return Ok(());
        }
    };

    let data = q.data.unwrap_or_default();
    let reply = ctx.handle(chat_id.0, Incoming::Selection(data)).await;
    send_reply(&bot, chat_id, reply).await
}
