//! Inbound events and control signals delivered to workers.

use std::fmt;

/// Stable identifier of one conversation (the Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Profile data of the chat partner, captured from the inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatProfile {
    /// Conversation identity this profile belongs to.
    pub id: ConversationId,
    /// First name as reported by the chat platform.
    pub first_name: String,
    /// Last name, when the profile has one.
    pub last_name: Option<String>,
    /// Public @username, when the profile has one.
    pub username: Option<String>,
}

/// The message carried by an inbound update.
///
/// Text may be absent (stickers, media, service messages).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Plain message text, if any.
    pub text: Option<String>,
}

/// An update originating from the transport, tagged with its conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUpdate {
    /// Profile of the chat the update belongs to.
    pub chat: ChatProfile,
    /// The message payload; `None` for non-message updates.
    pub message: Option<IncomingMessage>,
}

impl InboundUpdate {
    /// Update carrying a plain text message.
    #[must_use]
    pub fn text(chat: ChatProfile, text: impl Into<String>) -> Self {
        Self {
            chat,
            message: Some(IncomingMessage {
                text: Some(text.into()),
            }),
        }
    }

    /// Update with no message payload.
    #[must_use]
    pub fn bare(chat: ChatProfile) -> Self {
        Self {
            chat,
            message: None,
        }
    }

    /// The conversation this update is routed by.
    #[must_use]
    pub fn conversation(&self) -> ConversationId {
        self.chat.id
    }
}

/// Control message asking a worker to stop gracefully.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    /// Optional human-readable reason, forwarded to logs.
    pub reason: Option<String>,
}

/// What a mailbox can carry: a transport update or a stop signal.
///
/// The two are distinguished by variant, never by payload inspection.
#[derive(Debug)]
pub enum Envelope {
    /// An inbound event from the transport.
    Update(InboundUpdate),
    /// A graceful-stop request.
    Stop(StopSignal),
}
