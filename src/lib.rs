#![deny(missing_docs)]
//! Shopbot core library.
//!
//! A Telegram storefront bot built around one worker task per conversation:
//! inbound updates are routed into a per-chat mailbox and consumed by a
//! blocking conversation state machine with timeout- and signal-driven
//! graceful stop.

/// Telegram-facing layer: transport adapter, update ingestion, send retries.
pub mod bot;
/// Configuration management.
pub mod config;
/// User-menu branch handlers.
pub mod menu;
/// User and administrator persistence.
pub mod store;
/// Conversation texts and menu labels.
pub mod strings;
/// Outbound transport abstraction.
pub mod transport;
/// Per-conversation workers, their mailboxes, and the dispatch registry.
pub mod worker;
