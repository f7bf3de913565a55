//! Cache-backed session store
//!
//! Sessions assert that a login is still live, independently of token
//! cryptographic validity. The cache TTL is the liveness authority: deleting
//! a key revokes a session early even while its tokens would still verify.
//! One key per user id, so a new login overwrites any prior session.
//!
//! The store is injected as a trait object; tests use the in-memory fake.

use anyhow::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

/// Session payload stored under the user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub id: Uuid,
    pub email: String,
}

/// TTL-capable mapping from user identity to an active-session record
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store the session, overwriting any prior record for this user
    async fn put(&self, user_id: Uuid, payload: &SessionPayload, ttl: Duration) -> Result<()>;

    /// Fetch the session if present and unexpired
    async fn get(&self, user_id: Uuid) -> Result<Option<SessionPayload>>;

    /// Remove the session; a no-op if absent
    async fn delete(&self, user_id: Uuid) -> Result<()>;

    /// Liveness check of the backing cache
    async fn ping(&self) -> Result<()>;
}

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    /// Connect to Redis; the connection manager reconnects on failure
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Redis connection established");
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, user_id: Uuid, payload: &SessionPayload, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let value = serde_json::to_string(payload)?;
        redis::cmd("SET")
            .arg(user_id.to_string())
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<SessionPayload>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(user_id.to_string()).await?;
        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, user_id: Uuid) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(user_id.to_string()).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

/// In-memory session store for tests
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<Uuid, (SessionPayload, Instant)>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, user_id: Uuid, payload: &SessionPayload, ttl: Duration) -> Result<()> {
        let deadline = Instant::now() + ttl;
        self.entries
            .lock()
            .unwrap()
            .insert(user_id, (payload.clone(), deadline));
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<SessionPayload>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&user_id) {
            Some((payload, deadline)) if *deadline > Instant::now() => Ok(Some(payload.clone())),
            Some(_) => {
                // Lazily expire, mirroring the cache's TTL semantics
                entries.remove(&user_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, user_id: Uuid) -> Result<()> {
        self.entries.lock().unwrap().remove(&user_id);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
