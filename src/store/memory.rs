//! In-memory store.
//!
//! Shares the staged-commit semantics of the sqlite store. The extra seeding
//! and inspection methods exist for tests; nothing in the binary depends on
//! them.

use super::{AdminRecord, Store, StoreError, StoreSession, UserRecord};
use crate::worker::{ChatProfile, ConversationId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    users: HashMap<ConversationId, UserRecord>,
    admins: HashMap<ConversationId, AdminRecord>,
    creates_committed: u64,
}

/// Store keeping every record in process memory.
#[derive(Clone, Default)]
pub struct MemStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant administrator privileges to `id`.
    pub async fn add_admin(&self, id: ConversationId) {
        self.tables
            .lock()
            .await
            .admins
            .insert(id, AdminRecord { user_id: id });
    }

    /// Revoke administrator privileges from `id`.
    pub async fn remove_admin(&self, id: ConversationId) {
        self.tables.lock().await.admins.remove(&id);
    }

    /// Number of user records currently present.
    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    /// Total create operations ever committed, duplicates included.
    pub async fn creates_committed(&self) -> u64 {
        self.tables.lock().await.creates_committed
    }
}

#[async_trait]
impl Store for MemStore {
    async fn open_session(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        Ok(Box::new(MemSession {
            tables: self.tables.clone(),
            staged: Vec::new(),
        }))
    }
}

struct MemSession {
    tables: Arc<Mutex<Tables>>,
    staged: Vec<UserRecord>,
}

#[async_trait]
impl StoreSession for MemSession {
    async fn find_user(&mut self, id: ConversationId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn create_user(&mut self, profile: &ChatProfile) -> Result<UserRecord, StoreError> {
        let user = UserRecord::from_profile(profile);
        self.staged.push(user.clone());
        Ok(user)
    }

    async fn find_admin(&mut self, id: ConversationId) -> Result<Option<AdminRecord>, StoreError> {
        Ok(self.tables.lock().await.admins.get(&id).copied())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        if staged.is_empty() {
            return Ok(());
        }
        let mut tables = self.tables.lock().await;
        for user in staged {
            tables.creates_committed += 1;
            tables.users.entry(user.user_id).or_insert(user);
        }
        Ok(())
    }
}
