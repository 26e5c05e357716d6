//! The per-worker mailbox.
//!
//! Single consumer (the worker), any number of producers (the registry and
//! stop initiators). `put` never blocks; receiving blocks up to a timeout.
//! Items from one producer are delivered in the order they were enqueued.

use super::event::Envelope;
use std::time::Duration;
use tokio::sync::mpsc;

/// Create a connected mailbox pair.
#[must_use]
pub fn mailbox() -> (MailboxSender, Mailbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MailboxSender { tx }, Mailbox { rx })
}

/// Producer half of a mailbox. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MailboxSender {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl MailboxSender {
    /// Enqueue an item without blocking.
    ///
    /// Returns `false` when the consuming worker has already terminated and
    /// dropped its mailbox; the item is lost in that case.
    pub fn put(&self, item: Envelope) -> bool {
        self.tx.send(item).is_ok()
    }

    /// Whether the consuming worker has dropped its mailbox.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of a mailbox, owned exclusively by one worker.
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl Mailbox {
    /// Wait for the next item, up to `timeout`.
    ///
    /// `None` means the timeout elapsed, or every producer is gone.
    pub async fn next(&mut self, timeout: Duration) -> Option<Envelope> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(item) => item,
            Err(_) => None,
        }
    }
}
