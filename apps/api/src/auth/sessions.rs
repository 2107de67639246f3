use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::errors::AppError;

/// Sessions live for one day after the last write.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const REDIS_KEY_PREFIX: &str = "jobfinder:session:";

/// Generates an opaque session id.
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Server-side map from session id to the currently issued token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<String>, AppError>;

    /// Stores the token and restarts the session's TTL.
    async fn set(&self, session_id: &str, token: &str) -> Result<(), AppError>;

    /// Removes the entry. Destroying a missing session is not an error.
    async fn destroy(&self, session_id: &str) -> Result<(), AppError>;
}

/// Redis-backed sessions; expiry is delegated to Redis `EX`.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisSessionStore {
    pub async fn connect(client: redis::Client, ttl: Duration) -> Result<Self, AppError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, ttl })
    }

    fn key(session_id: &str) -> String {
        format!("{REDIS_KEY_PREFIX}{session_id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let token: Option<String> = redis::cmd("GET")
            .arg(Self::key(session_id))
            .query_async(&mut conn)
            .await?;
        Ok(token)
    }

    async fn set(&self, session_id: &str, token: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(Self::key(session_id))
            .arg(token)
            .arg("EX")
            .arg(self.ttl.as_secs())
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(Self::key(session_id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

struct MemoryEntry {
    token: String,
    expires_at: Instant,
}

/// Process-local sessions. Expired entries are dropped when read.
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<String>, AppError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(session_id) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.token.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(session_id)
            .is_some_and(|entry| entry.expires_at <= now)
        {
            entries.remove(session_id);
        }
        Ok(None)
    }

    async fn set(&self, session_id: &str, token: &str) -> Result<(), AppError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        // Expired entries are dropped on every write, not only on read.
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            session_id.to_string(),
            MemoryEntry {
                token: token.to_string(),
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(session_id);
        Ok(())
    }
}
