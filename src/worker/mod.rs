//! Per-conversation workers.
//!
//! Each active chat gets one tokio task that owns a single-consumer mailbox
//! and runs the conversation state machine. The [`WorkerRegistry`] is the only
//! state shared across conversations: it routes inbound updates to the right
//! mailbox, spawning a worker when none is running for that chat.

/// The conversation state machine run by each worker task.
pub mod chat_worker;
/// Inbound events and control signals delivered to workers.
pub mod event;
/// The per-worker mailbox.
pub mod mailbox;
/// The identity-to-worker registry.
pub mod registry;

pub use chat_worker::{ChatWorker, WorkerContext, WorkerError};
pub use event::{ChatProfile, ConversationId, Envelope, InboundUpdate, IncomingMessage, StopSignal};
pub use mailbox::{mailbox, Mailbox, MailboxSender};
pub use registry::WorkerRegistry;
