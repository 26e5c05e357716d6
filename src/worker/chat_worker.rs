//! The conversation state machine run by each worker task.
//!
//! A worker welcomes the chat, registers the user on first contact, decides
//! the role branch once, then loops on its menu. Every blocking point goes
//! through [`ChatWorker::receive_next`], so a timeout or a stop signal unwinds
//! the whole state machine into a single goodbye notification.

use super::event::{ChatProfile, Envelope, InboundUpdate, StopSignal};
use super::mailbox::Mailbox;
use crate::menu;
use crate::store::{AdminRecord, Store, StoreError, StoreSession, UserRecord};
use crate::strings;
use crate::transport::{Keyboard, Transport};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why a conversation left its state machine.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// No input arrived within the configured timeout.
    #[error("conversation timed out waiting for input")]
    Expired,
    /// An external actor asked the worker to stop.
    #[error("conversation stopped")]
    Stopped {
        /// Reason supplied by the stop initiator, if any.
        reason: Option<String>,
    },
    /// The transport failed while sending.
    #[error("transport failure: {0}")]
    Transport(anyhow::Error),
    /// The persistence store failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl From<anyhow::Error> for WorkerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Transport(err)
    }
}

/// Collaborators shared by every worker the registry spawns.
#[derive(Clone)]
pub struct WorkerContext {
    /// Outbound transport.
    pub transport: Arc<dyn Transport>,
    /// Persistence store; each worker opens its own session.
    pub store: Arc<dyn Store>,
    /// How long a blocked worker waits for input before expiring.
    pub conversation_timeout: Duration,
}

/// Role branch, decided once when the conversation starts.
enum Role {
    Customer(UserRecord),
    Admin(AdminRecord),
}

/// One conversation: owns the mailbox and drives the chat state machine.
pub struct ChatWorker {
    chat: ChatProfile,
    mailbox: Mailbox,
    transport: Arc<dyn Transport>,
    store: Arc<dyn Store>,
    timeout: Duration,
}

impl ChatWorker {
    /// Build a worker around its mailbox and shared collaborators.
    #[must_use]
    pub fn new(chat: ChatProfile, mailbox: Mailbox, context: &WorkerContext) -> Self {
        Self {
            chat,
            mailbox,
            transport: context.transport.clone(),
            store: context.store.clone(),
            timeout: context.conversation_timeout,
        }
    }

    /// Run the conversation to completion, including the goodbye notification.
    ///
    /// This is the task entry point and it never returns an error: expiry and
    /// explicit stops end with a single "conversation over" message, while a
    /// failing collaborator is logged and the worker ends without notifying
    /// the chat. The store session is released before this returns.
    pub async fn run_to_completion(mut self) {
        let chat = self.chat.id;
        match self.conversation().await {
            Ok(()) => info!(%chat, "conversation finished"),
            Err(WorkerError::Expired) => {
                info!(%chat, "conversation expired");
                self.notify_closed().await;
            }
            Err(WorkerError::Stopped { reason }) => {
                info!(%chat, reason = reason.as_deref().unwrap_or(""), "conversation stopped");
                self.notify_closed().await;
            }
            Err(err) => error!(%chat, error = %err, "conversation aborted"),
        }
    }

    /// The conversation itself: welcome, registration, role dispatch, menu.
    async fn conversation(&mut self) -> Result<(), WorkerError> {
        self.transport
            .send_message(self.chat.id, strings::CONVERSATION_AFTER_START, None)
            .await?;
        let mut session = self.store.open_session().await?;
        let role = self.dispatch_role(session.as_mut()).await?;
        match role {
            Role::Customer(user) => self.user_menu(&user).await,
            Role::Admin(admin) => self.admin_menu(&admin).await,
        }
    }

    /// Register the user on first contact and decide the role branch.
    ///
    /// The branch is fixed here for the worker's whole lifetime; the admin
    /// table is not consulted again.
    async fn dispatch_role(
        &mut self,
        session: &mut dyn StoreSession,
    ) -> Result<Role, WorkerError> {
        let user = match session.find_user(self.chat.id).await? {
            Some(user) => user,
            None => {
                let user = session.create_user(&self.chat).await?;
                session.commit().await?;
                info!(chat = %self.chat.id, user = %user, "registered new user");
                user
            }
        };
        match session.find_admin(self.chat.id).await? {
            Some(admin) => Ok(Role::Admin(admin)),
            None => Ok(Role::Customer(user)),
        }
    }

    /// Top-level menu for ordinary users; loops until the conversation ends.
    ///
    /// Every iteration re-sends the full one-shot keyboard.
    async fn user_menu(&mut self, user: &UserRecord) -> Result<(), WorkerError> {
        loop {
            let keyboard = Keyboard::one_shot(strings::USER_MENU_LABELS);
            self.transport
                .send_message(
                    self.chat.id,
                    &strings::open_user_menu(user),
                    Some(&keyboard),
                )
                .await?;
            let selection = self.wait_for_selection(&strings::USER_MENU_LABELS).await?;
            let transport = self.transport.as_ref();
            if selection == strings::MENU_ORDER {
                menu::order(transport, self.chat.id).await?;
            } else if selection == strings::MENU_ORDER_STATUS {
                menu::order_status(transport, self.chat.id).await?;
            } else if selection == strings::MENU_ADD_CREDIT {
                menu::add_credit(transport, self.chat.id).await?;
            } else if selection == strings::MENU_INFO {
                menu::info(transport, self.chat.id).await?;
            }
        }
    }

    /// Admin branch: a fixed acknowledgement, then the same timeout and stop
    /// machinery as the user menu. There are no admin actions yet.
    async fn admin_menu(&mut self, _admin: &AdminRecord) -> Result<(), WorkerError> {
        self.transport
            .send_message(self.chat.id, strings::CONVERSATION_ADMIN_WELCOME, None)
            .await?;
        loop {
            let update = self.receive_next().await?;
            debug!(chat = %self.chat.id, ?update, "ignoring update in the admin branch");
        }
    }

    /// Pop the next inbound update from the mailbox.
    ///
    /// The single suspension point of a worker: a timeout or a stop signal
    /// surfaces here as an error and unwinds the state machine.
    async fn receive_next(&mut self) -> Result<InboundUpdate, WorkerError> {
        match self.mailbox.next(self.timeout).await {
            Some(Envelope::Update(update)) => Ok(update),
            Some(Envelope::Stop(StopSignal { reason })) => Err(WorkerError::Stopped { reason }),
            None => Err(WorkerError::Expired),
        }
    }

    /// Keep receiving until one of `options` arrives as message text.
    ///
    /// Updates without a message, without text, or with text outside
    /// `options` are discarded. Every discarded update paid one mailbox wait,
    /// so the loop cannot spin.
    async fn wait_for_selection(&mut self, options: &[&str]) -> Result<String, WorkerError> {
        loop {
            let update = self.receive_next().await?;
            let Some(message) = update.message else {
                debug!(chat = %self.chat.id, "discarding update without a message");
                continue;
            };
            let Some(text) = message.text else {
                debug!(chat = %self.chat.id, "discarding message without text");
                continue;
            };
            if options.contains(&text.as_str()) {
                return Ok(text);
            }
            debug!(chat = %self.chat.id, %text, "discarding text outside the expected options");
        }
    }

    /// Tell the chat the conversation is over. Failures are only logged: the
    /// worker is terminating either way.
    async fn notify_closed(&self) {
        if let Err(err) = self
            .transport
            .send_message(self.chat.id, strings::CONVERSATION_EXPIRED, None)
            .await
        {
            warn!(chat = %self.chat.id, error = %err, "failed to deliver the closing notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use crate::worker::event::ConversationId;
    use crate::worker::mailbox::{mailbox, MailboxSender};
    use anyhow::Result;
    use async_trait::async_trait;

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn send_message(
            &self,
            _chat: ConversationId,
            _text: &str,
            _keyboard: Option<&Keyboard>,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn context(timeout: Duration) -> WorkerContext {
        WorkerContext {
            transport: Arc::new(NullTransport),
            store: Arc::new(MemStore::new()),
            conversation_timeout: timeout,
        }
    }

    fn worker(timeout: Duration) -> (MailboxSender, ChatWorker) {
        let chat = ChatProfile {
            id: ConversationId(7),
            first_name: "Ada".to_string(),
            last_name: None,
            username: None,
        };
        let (tx, inbox) = mailbox();
        (tx, ChatWorker::new(chat, inbox, &context(timeout)))
    }

    #[tokio::test]
    async fn selection_skips_non_matching_updates() {
        let (tx, mut worker) = worker(Duration::from_secs(1));
        let chat = worker.chat.clone();
        tx.put(Envelope::Update(InboundUpdate::bare(chat.clone())));
        tx.put(Envelope::Update(InboundUpdate {
            chat: chat.clone(),
            message: Some(crate::worker::event::IncomingMessage { text: None }),
        }));
        tx.put(Envelope::Update(InboundUpdate::text(
            chat.clone(),
            "not on the menu",
        )));
        tx.put(Envelope::Update(InboundUpdate::text(
            chat,
            strings::MENU_INFO,
        )));

        match worker.wait_for_selection(&strings::USER_MENU_LABELS).await {
            Ok(text) => assert_eq!(text, strings::MENU_INFO),
            Err(err) => panic!("selection failed: {err}"),
        }
    }

    #[tokio::test]
    async fn stop_signal_unwinds_the_wait() {
        let (tx, mut worker) = worker(Duration::from_secs(1));
        tx.put(Envelope::Stop(StopSignal {
            reason: Some("maintenance".to_string()),
        }));

        match worker.wait_for_selection(&strings::USER_MENU_LABELS).await {
            Err(WorkerError::Stopped { reason }) => {
                assert_eq!(reason.as_deref(), Some("maintenance"));
            }
            other => panic!("expected a stop, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_mailbox_expires_the_wait() {
        let (_tx, mut worker) = worker(Duration::from_millis(50));
        match worker.wait_for_selection(&strings::USER_MENU_LABELS).await {
            Err(WorkerError::Expired) => {}
            other => panic!("expected expiry, got {other:?}"),
        }
    }
}
