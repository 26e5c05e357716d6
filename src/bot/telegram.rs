//! Telegram transport adapter.

use crate::bot::resilient::retry_telegram_operation;
use crate::transport::{Keyboard, Transport};
use crate::worker::ConversationId;
use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, KeyboardButton, KeyboardMarkup};

/// [`Transport`] implementation backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Wrap a teloxide bot.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Map the core keyboard model onto a Telegram reply keyboard.
fn reply_markup(keyboard: &Keyboard) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = keyboard
        .labels
        .iter()
        .map(|label| vec![KeyboardButton::new(label.clone())])
        .collect();
    let markup = KeyboardMarkup::new(rows).resize_keyboard();
    if keyboard.one_time {
        markup.one_time_keyboard()
    } else {
        markup
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(
        &self,
        chat: ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        let chat_id = ChatId(chat.0);
        let markup = keyboard.map(reply_markup);
        retry_telegram_operation(|| async {
            let mut request = self.bot.send_message(chat_id, text.to_string());
            if let Some(markup) = markup.clone() {
                request = request.reply_markup(markup);
            }
            request
                .await
                .map(|_| ())
                .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
        })
        .await
    }
}
