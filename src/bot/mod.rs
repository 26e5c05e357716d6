//! Telegram-facing layer.
//!
//! Everything that knows about teloxide lives here: the [`TelegramTransport`]
//! implementation of the core transport trait, conversion of raw updates into
//! core inbound events, and retry helpers for the Bot API.

/// Conversion of teloxide updates into core inbound events.
pub mod ingest;
/// Retry helpers for Telegram API calls.
pub mod resilient;
/// The teloxide implementation of [`crate::transport::Transport`].
pub mod telegram;

pub use telegram::TelegramTransport;
