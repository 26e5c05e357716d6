//! Sqlite-backed store.
//!
//! One background connection per process; all access goes through
//! `tokio_rusqlite`'s call closures. The schema is applied when the store is
//! opened, so a fresh database file is usable immediately.

use super::{AdminRecord, Store, StoreError, StoreSession, UserRecord};
use crate::worker::{ChatProfile, ConversationId};
use async_trait::async_trait;
use rusqlite::params;
use tokio_rusqlite::Connection;
use tracing::info;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id    INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name  TEXT,
    username   TEXT
);
CREATE TABLE IF NOT EXISTS admins (
    user_id INTEGER PRIMARY KEY
);
";

/// Store backed by a sqlite database file.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] when the file cannot be opened or the
    /// schema cannot be applied.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path.to_owned())
            .await
            .map_err(|e| StoreError::Open(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory database, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] when the schema cannot be applied.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Open(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| -> rusqlite::Result<()> {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Open(e.into()))?;
        info!("sqlite store ready");
        Ok(Self { conn })
    }

    /// Grant administrator privileges to `id`.
    ///
    /// There is no in-bot flow for this; operators seed admins out of band.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Commit`] when the insert fails.
    pub async fn add_admin(&self, id: ConversationId) -> Result<(), StoreError> {
        self.conn
            .call(move |conn| -> rusqlite::Result<()> {
                conn.execute(
                    "INSERT INTO admins (user_id) VALUES (?1) ON CONFLICT(user_id) DO NOTHING",
                    params![id.0],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Commit(e.into()))
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn open_session(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        Ok(Box::new(SqliteSession {
            conn: self.conn.clone(),
            staged: Vec::new(),
        }))
    }
}

/// Session over the shared connection; staged user records are applied in one
/// transaction on commit.
struct SqliteSession {
    conn: Connection,
    staged: Vec<UserRecord>,
}

#[async_trait]
impl StoreSession for SqliteSession {
    async fn find_user(&mut self, id: ConversationId) -> Result<Option<UserRecord>, StoreError> {
        self.conn
            .call(move |conn| -> rusqlite::Result<Option<UserRecord>> {
                let mut stmt = conn.prepare(
                    "SELECT user_id, first_name, last_name, username
                     FROM users WHERE user_id = ?1",
                )?;
                let row = stmt.query_row(params![id.0], |row| {
                    Ok(UserRecord {
                        user_id: ConversationId(row.get(0)?),
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        username: row.get(3)?,
                    })
                });
                match row {
                    Ok(user) => Ok(Some(user)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(|e| StoreError::Lookup(e.into()))
    }

    async fn create_user(&mut self, profile: &ChatProfile) -> Result<UserRecord, StoreError> {
        let user = UserRecord::from_profile(profile);
        self.staged.push(user.clone());
        Ok(user)
    }

    async fn find_admin(&mut self, id: ConversationId) -> Result<Option<AdminRecord>, StoreError> {
        self.conn
            .call(move |conn| -> rusqlite::Result<Option<AdminRecord>> {
                let mut stmt = conn.prepare("SELECT user_id FROM admins WHERE user_id = ?1")?;
                let row = stmt.query_row(params![id.0], |row| {
                    Ok(AdminRecord {
                        user_id: ConversationId(row.get(0)?),
                    })
                });
                match row {
                    Ok(admin) => Ok(Some(admin)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(|e| StoreError::Lookup(e.into()))
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        if staged.is_empty() {
            return Ok(());
        }
        self.conn
            .call(move |conn| -> rusqlite::Result<()> {
                let tx = conn.transaction()?;
                for user in &staged {
                    tx.execute(
                        "INSERT INTO users (user_id, first_name, last_name, username)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(user_id) DO NOTHING",
                        params![
                            user.user_id.0,
                            user.first_name,
                            user.last_name,
                            user.username
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Commit(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: i64) -> ChatProfile {
        ChatProfile {
            id: ConversationId(id),
            first_name: "Ada".to_string(),
            last_name: Some("Lovelace".to_string()),
            username: Some("ada".to_string()),
        }
    }

    #[tokio::test]
    async fn user_roundtrip_through_commit() -> Result<(), StoreError> {
        let store = SqliteStore::in_memory().await?;
        let mut session = store.open_session().await?;

        assert!(session.find_user(ConversationId(1)).await?.is_none());
        let created = session.create_user(&profile(1)).await?;
        session.commit().await?;

        let mut second = store.open_session().await?;
        let found = second.find_user(ConversationId(1)).await?;
        assert_eq!(found, Some(created));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_commit_does_not_clobber() -> Result<(), StoreError> {
        let store = SqliteStore::in_memory().await?;
        let mut session = store.open_session().await?;
        session.create_user(&profile(2)).await?;
        session.commit().await?;

        let mut session = store.open_session().await?;
        let mut altered = profile(2);
        altered.first_name = "Someone".to_string();
        session.create_user(&altered).await?;
        session.commit().await?;

        let found = session.find_user(ConversationId(2)).await?;
        match found {
            Some(user) => assert_eq!(user.first_name, "Ada"),
            None => panic!("user record missing after duplicate commit"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn admin_lookup_reflects_seeding() -> Result<(), StoreError> {
        let store = SqliteStore::in_memory().await?;
        let mut session = store.open_session().await?;
        assert!(session.find_admin(ConversationId(3)).await?.is_none());

        store.add_admin(ConversationId(3)).await?;
        let admin = session.find_admin(ConversationId(3)).await?;
        assert_eq!(
            admin,
            Some(AdminRecord {
                user_id: ConversationId(3)
            })
        );
        Ok(())
    }
}
