//! Login session storage.
//!
//! A session token is 32 random bytes, hex-encoded, handed to the browser in
//! the `session_id` cookie. The SQLite store keeps only the SHA-256 of the
//! token, so a leaked database cannot be replayed as cookies.

use crate::db::Repository;
use crate::domain::TimeMs;
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Server-side session storage.
#[async_trait]
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// Open a session for a user and return the cookie token.
    async fn create(&self, user_id: i64) -> Result<String, SessionError>;

    /// User behind a token, or `None` if unknown or expired. Expired sessions
    /// are removed as a side effect.
    async fn user_for(&self, token: &str) -> Result<Option<i64>, SessionError>;

    /// Forget a session. Unknown tokens are ignored.
    async fn delete(&self, token: &str) -> Result<(), SessionError>;

    /// Remove every expired session, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, SessionError>;
}

/// Fresh random session token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Storage key of a token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Sessions persisted in the `auth_sessions` table; they survive restarts.
pub struct SqliteSessionStore {
    repo: Arc<Repository>,
    ttl_secs: i64,
}

impl SqliteSessionStore {
    pub fn new(repo: Arc<Repository>, ttl_secs: i64) -> Self {
        Self { repo, ttl_secs }
    }
}

impl fmt::Debug for SqliteSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSessionStore")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, user_id: i64) -> Result<String, SessionError> {
        let token = generate_token();
        let now = TimeMs::now();
        self.repo
            .insert_auth_session(&hash_token(&token), user_id, now, now.plus_secs(self.ttl_secs))
            .await?;
        info!(user_id, "Session created");
        Ok(token)
    }

    async fn user_for(&self, token: &str) -> Result<Option<i64>, SessionError> {
        let token_hash = hash_token(token);
        let Some(row) = self.repo.get_auth_session(&token_hash).await? else {
            return Ok(None);
        };

        if TimeMs::now() > row.expires_at {
            debug!(user_id = row.user_id, "Session expired");
            self.repo.delete_auth_session(&token_hash).await?;
            return Ok(None);
        }

        Ok(Some(row.user_id))
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        self.repo.delete_auth_session(&hash_token(token)).await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        Ok(self.repo.purge_expired_auth_sessions(TimeMs::now()).await?)
    }
}

/// Process-local sessions, lost on restart. Used by tests.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, (i64, TimeMs)>>,
    ttl_secs: i64,
}

impl MemorySessionStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl_secs,
        }
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: i64) -> Result<String, SessionError> {
        let token = generate_token();
        let expires_at = TimeMs::now().plus_secs(self.ttl_secs);
        self.sessions
            .write()
            .await
            .insert(hash_token(&token), (user_id, expires_at));
        Ok(token)
    }

    async fn user_for(&self, token: &str) -> Result<Option<i64>, SessionError> {
        let key = hash_token(token);
        let mut sessions = self.sessions.write().await;
        match sessions.get(&key).copied() {
            Some((_, expires_at)) if TimeMs::now() > expires_at => {
                sessions.remove(&key);
                Ok(None)
            }
            Some((user_id, _)) => Ok(Some(user_id)),
            None => Ok(None),
        }
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(&hash_token(token));
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let now = TimeMs::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, (_, expires_at)| *expires_at >= now);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    #[test]
    fn test_generate_token_is_random_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_token_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_ne!(hash_token("abc"), "abc");
    }

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemorySessionStore::new(3600);

        let token = store.create(42).await.unwrap();
        assert!(!token.is_empty());
        assert_eq!(store.user_for(&token).await.unwrap(), Some(42));
        assert_eq!(store.len().await, 1);

        store.delete(&token).await.unwrap();
        assert_eq!(store.user_for(&token).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_invalid_token() {
        let store = MemorySessionStore::new(3600);
        assert_eq!(store.user_for("invalid_session_id").await.unwrap(), None);
        store.delete("invalid_session_id").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemorySessionStore::new(-1);
        let token = store.create(1).await.unwrap();

        assert_eq!(store.user_for(&token).await.unwrap(), None);
        assert!(store.is_empty().await);

        store.create(2).await.unwrap();
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }

    async fn sqlite_store(ttl_secs: i64) -> (SqliteSessionStore, Arc<Repository>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        let repo = Arc::new(Repository::new(pool));
        (SqliteSessionStore::new(repo.clone(), ttl_secs), repo, temp_dir)
    }

    #[tokio::test]
    async fn test_sqlite_store_lifecycle() {
        let (store, repo, _temp) = sqlite_store(3600).await;
        let user = repo
            .create_user("alice", "alice@example.com", "hash")
            .await
            .unwrap();

        let token = store.create(user.id).await.unwrap();
        assert_eq!(store.user_for(&token).await.unwrap(), Some(user.id));

        // Only the hash is stored.
        assert!(repo.get_auth_session(&token).await.unwrap().is_none());
        assert!(repo
            .get_auth_session(&hash_token(&token))
            .await
            .unwrap()
            .is_some());

        store.delete(&token).await.unwrap();
        assert_eq!(store.user_for(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_store_expiry() {
        let (store, repo, _temp) = sqlite_store(-10).await;
        let user = repo
            .create_user("alice", "alice@example.com", "hash")
            .await
            .unwrap();

        let token = store.create(user.id).await.unwrap();
        assert_eq!(store.user_for(&token).await.unwrap(), None);
        assert!(repo
            .get_auth_session(&hash_token(&token))
            .await
            .unwrap()
            .is_none());

        store.create(user.id).await.unwrap();
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }
}
