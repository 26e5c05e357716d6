//! User-menu branch handlers.
//!
//! The real order and credit flows are not built yet; each branch answers
//! with a fixed message so the menu loop stays usable end to end.

use crate::strings;
use crate::transport::Transport;
use crate::worker::ConversationId;
use anyhow::Result;

/// Start a new order.
pub async fn order(transport: &dyn Transport, chat: ConversationId) -> Result<()> {
    transport
        .send_message(chat, strings::ORDER_PLACEHOLDER, None)
        .await
}

/// Show the status of the user's orders.
pub async fn order_status(transport: &dyn Transport, chat: ConversationId) -> Result<()> {
    transport
        .send_message(chat, strings::ORDER_STATUS_PLACEHOLDER, None)
        .await
}

/// Top up the user's wallet.
pub async fn add_credit(transport: &dyn Transport, chat: ConversationId) -> Result<()> {
    transport
        .send_message(chat, strings::ADD_CREDIT_PLACEHOLDER, None)
        .await
}

/// Describe the bot.
pub async fn info(transport: &dyn Transport, chat: ConversationId) -> Result<()> {
    transport.send_message(chat, strings::BOT_INFO, None).await
}
