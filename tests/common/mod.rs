//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use shopbot::transport::{Keyboard, Transport};
use shopbot::worker::{ChatProfile, InboundUpdate, WorkerContext, WorkerRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub use shopbot::store::MemStore;
pub use shopbot::worker::ConversationId;

/// One outbound message captured by the recording transport.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat: ConversationId,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

/// Transport that records every send instead of talking to a chat platform.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn count_with_text(&self, text: &str) -> usize {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.text == text)
            .count()
    }

    pub async fn keyboard_renders(&self) -> usize {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.keyboard.is_some())
            .count()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(
        &self,
        chat: ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        self.sent.lock().await.push(SentMessage {
            chat,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }
}

pub fn profile(id: i64, first_name: &str) -> ChatProfile {
    ChatProfile {
        id: ConversationId(id),
        first_name: first_name.to_string(),
        last_name: None,
        username: None,
    }
}

pub fn text_update(chat: &ChatProfile, text: &str) -> InboundUpdate {
    InboundUpdate::text(chat.clone(), text)
}

pub fn registry_with(
    transport: &RecordingTransport,
    store: &MemStore,
    timeout: Duration,
) -> Arc<WorkerRegistry> {
    WorkerRegistry::new(WorkerContext {
        transport: Arc::new(transport.clone()),
        store: Arc::new(store.clone()),
        conversation_timeout: timeout,
    })
}

/// Poll until `registry` no longer tracks `id`, or panic after ~3 s.
pub async fn wait_until_gone(registry: &Arc<WorkerRegistry>, id: ConversationId) {
    for _ in 0..300 {
        if !registry.contains(id).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("worker for {id} is still registered");
}

/// Poll until `text` has been sent at least once, or panic after ~3 s.
pub async fn wait_for_message(transport: &RecordingTransport, text: &str) {
    for _ in 0..300 {
        if transport.count_with_text(text).await > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("message {text:?} was never sent");
}

/// Poll until `count` keyboards have been rendered, or panic after ~3 s.
pub async fn wait_for_keyboards(transport: &RecordingTransport, count: usize) {
    for _ in 0..300 {
        if transport.keyboard_renders().await >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("fewer than {count} keyboards were rendered");
}
