//! Outbound transport abstraction.
//!
//! The conversation core is transport-agnostic: workers talk to the chat
//! platform through this trait. The production implementation is
//! [`crate::bot::TelegramTransport`]; tests use recording fakes.

use crate::worker::ConversationId;
use anyhow::Result;
use async_trait::async_trait;

/// A reply keyboard to attach to an outgoing message.
///
/// Each label becomes one button row, in order. Transports map this onto
/// their native keyboard type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    /// Ordered button labels, one per row.
    pub labels: Vec<String>,
    /// Hide the keyboard after the first press.
    pub one_time: bool,
}

impl Keyboard {
    /// Build a keyboard that disappears after one selection.
    pub fn one_shot<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            one_time: true,
        }
    }
}

/// Transport adapter used by conversation workers.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send a text message to a conversation, optionally with a reply
    /// keyboard.
    async fn send_message(
        &self,
        chat: ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_keeps_label_order() {
        let keyboard = Keyboard::one_shot(["first", "second"]);
        assert_eq!(keyboard.labels, ["first", "second"]);
        assert!(keyboard.one_time);
    }
}
