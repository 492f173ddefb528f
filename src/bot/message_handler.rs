//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

use crate::localization::t;

use super::context::{BotContext, Incoming};
use super::ui_builder::{create_keyboard, Reply};

/// Send a reply, with its inline keyboard when it has buttons
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<()> {
    let keyboard = create_keyboard(&reply.buttons);
    let mut request = bot.send_message(chat_id, reply.text);
    if let Some(keyboard) = keyboard {
        request = request.reply_markup(keyboard);
    }
    request.await?;
    Ok(())
}

pub async fn message_handler(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> Result<()> {
    let Some(text) = msg.text() else {
        debug!(user_id = %msg.chat.id, "Received unsupported message type from user");
        bot.send_message(msg.chat.id, t("unsupported-message")).await?;
        return Ok(());
    };

    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    let reply = ctx.handle(msg.chat.id.0, Incoming::Text(text.to_string())).await;
    send_reply(&bot, msg.chat.id, reply).await
}
