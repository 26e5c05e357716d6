//! Conversion of teloxide updates into core inbound events.

use crate::worker::{ChatProfile, ConversationId, InboundUpdate, IncomingMessage};
use teloxide::types::Message;

/// Build the core inbound event for a Telegram message.
///
/// The profile prefers the sender's details; messages without a sender fall
/// back to an empty name so registration still works.
#[must_use]
pub fn inbound_from_message(msg: &Message) -> InboundUpdate {
    let chat = ChatProfile {
        id: ConversationId(msg.chat.id.0),
        first_name: msg
            .from
            .as_ref()
            .map(|user| user.first_name.clone())
            .unwrap_or_default(),
        last_name: msg.from.as_ref().and_then(|user| user.last_name.clone()),
        username: msg.from.as_ref().and_then(|user| user.username.clone()),
    };
    InboundUpdate {
        chat,
        message: Some(IncomingMessage {
            text: msg.text().map(str::to_owned),
        }),
    }
}
