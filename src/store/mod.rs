//! User and administrator persistence.
//!
//! The conversation core needs two things from the store: load-or-create the
//! user record on first contact, and look up administrator privileges. Both
//! run through a per-worker [`StoreSession`]; writes are staged on the
//! session and only become durable on [`StoreSession::commit`].

/// In-memory store used by tests and local development.
pub mod memory;
/// Sqlite-backed store.
pub mod sqlite;

use crate::worker::{ChatProfile, ConversationId};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub use memory::MemStore;
pub use sqlite::SqliteStore;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database could not be opened or prepared.
    #[error("failed to open the store: {0}")]
    Open(#[source] anyhow::Error),
    /// A lookup failed.
    #[error("store lookup failed: {0}")]
    Lookup(#[source] anyhow::Error),
    /// Applying staged writes failed.
    #[error("store commit failed: {0}")]
    Commit(#[source] anyhow::Error),
}

/// A registered shop user, keyed by conversation identity.
///
/// At most one record exists per identity; it is created lazily on first
/// contact and never migrates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Conversation identity the record belongs to.
    pub user_id: ConversationId,
    /// First name captured at registration.
    pub first_name: String,
    /// Last name, when the profile had one.
    pub last_name: Option<String>,
    /// Public @username, when the profile had one.
    pub username: Option<String>,
}

impl UserRecord {
    /// Build a record from the inbound chat profile.
    #[must_use]
    pub fn from_profile(profile: &ChatProfile) -> Self {
        Self {
            user_id: profile.id,
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            username: profile.username.clone(),
        }
    }
}

impl fmt::Display for UserRecord {
    // Renders as `first_name last_name (@username)`, skipping missing parts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_name)?;
        if let Some(last_name) = &self.last_name {
            write!(f, " {last_name}")?;
        }
        if let Some(username) = &self.username {
            write!(f, " (@{username})")?;
        }
        Ok(())
    }
}

/// Administrator privileges for one conversation identity.
///
/// Presence of the record is what grants the admin branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminRecord {
    /// Conversation identity holding the privileges.
    pub user_id: ConversationId,
}

/// A store backend able to open per-worker sessions.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Open a session. Each worker holds exactly one, for its whole lifetime.
    async fn open_session(&self) -> Result<Box<dyn StoreSession>, StoreError>;
}

/// One worker's window onto the store.
///
/// Dropping a session discards anything staged but not committed.
#[async_trait]
pub trait StoreSession: Send {
    /// Look up the user record for `id`.
    async fn find_user(&mut self, id: ConversationId) -> Result<Option<UserRecord>, StoreError>;
    /// Stage a new user record built from `profile`.
    async fn create_user(&mut self, profile: &ChatProfile) -> Result<UserRecord, StoreError>;
    /// Look up administrator privileges for `id`.
    async fn find_admin(&mut self, id: ConversationId) -> Result<Option<AdminRecord>, StoreError>;
    /// Apply staged writes.
    async fn commit(&mut self) -> Result<(), StoreError>;
}
