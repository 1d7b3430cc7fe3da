//! Server-side sessions
//!
//! A JWT is only honoured while its session record exists. Sessions are
//! indexed per user (by lowercased email) so that every session of an
//! identity can be revoked at once.

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::RngCore;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::enums::Role,
};

/// Delay before the single connection retry at start-up
const INIT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque id carried in the token's `sid` claim
    pub id: String,
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user_id: Uuid, email: &str, role: Role, ttl: Duration) -> AppResult<Session>;

    /// Live session by id; expired or revoked sessions are `None`
    async fn get(&self, session_id: &str) -> AppResult<Option<Session>>;

    async fn revoke(&self, session_id: &str) -> AppResult<()>;

    /// Revoke every session of an identity; returns how many were removed
    async fn revoke_all_for_user(&self, email: &str) -> AppResult<usize>;

    /// Release backend resources at shutdown
    async fn close(&self) -> AppResult<()>;
}

fn new_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Storage key for a session id; raw ids never reach the backend
fn session_digest(session_id: &str) -> String {
    hex::encode(Sha256::digest(session_id.as_bytes()))
}

fn user_key(email: &str) -> String {
    format!("user_sessions:{}", email.trim().to_lowercase())
}

fn new_session(user_id: Uuid, email: &str, role: Role, ttl: Duration) -> AppResult<Session> {
    let created_at = Utc::now();
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| AppError::Internal(format!("Invalid session lifetime: {}", e)))?;
    Ok(Session {
        id: new_session_id(),
        user_id,
        email: email.trim().to_lowercase(),
        role,
        created_at,
        expires_at: created_at + ttl,
    })
}

/// Run `attempt`; if it fails with a transient error, wait `delay` and run it once more.
pub(crate) async fn retry_once<T, E, F, Fut>(
    mut attempt: F,
    is_transient: impl Fn(&E) -> bool,
    delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match attempt().await {
        Ok(value) => Ok(value),
        Err(e) if is_transient(&e) => {
            tracing::warn!("Session store unreachable ({}), retrying in {:?}", e, delay);
            tokio::time::sleep(delay).await;
            attempt().await
        }
        Err(e) => Err(e),
    }
}

fn is_network_error(e: &redis::RedisError) -> bool {
    e.is_io_error() || e.is_connection_refusal() || e.is_timeout() || e.is_connection_dropped()
}

/// Redis-backed sessions: `session:{digest}` with TTL plus a per-user index set
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
}

impl RedisSessionStore {
    /// Connect and PING, retrying once on a network-class failure
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        retry_once(
            || {
                let client = client.clone();
                async move {
                    let mut conn = client.get_multiplexed_async_connection().await?;
                    redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
                    Ok::<_, redis::RedisError>(())
                }
            },
            is_network_error,
            INIT_RETRY_DELAY,
        )
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, user_id: Uuid, email: &str, role: Role, ttl: Duration) -> AppResult<Session> {
        let session = new_session(user_id, email, role, ttl)?;
        let digest = session_digest(&session.id);
        let payload = serde_json::to_string(&session)
            .map_err(|e| AppError::Internal(format!("Failed to encode session: {}", e)))?;
        let index = user_key(&session.email);
        let seconds = ttl.as_secs().max(1);

        let mut conn = self.connection().await?;
        redis::pipe()
            .atomic()
            .set_ex(format!("session:{}", digest), payload, seconds)
            .ignore()
            .sadd(&index, &digest)
            .ignore()
            .expire(&index, seconds as i64)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store session in Redis: {}", e)))?;

        Ok(session)
    }

    async fn get(&self, session_id: &str) -> AppResult<Option<Session>> {
        let mut conn = self.connection().await?;
        let key = format!("session:{}", session_digest(session_id));
        let payload: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read session from Redis: {}", e)))?;

        match payload {
            Some(json) => {
                let session: Session = serde_json::from_str(&json)
                    .map_err(|e| AppError::Internal(format!("Corrupt session record: {}", e)))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn revoke(&self, session_id: &str) -> AppResult<()> {
        let session = self.get(session_id).await?;
        let digest = session_digest(session_id);
        let mut conn = self.connection().await?;

        let mut pipe = redis::pipe();
        pipe.atomic().del(format!("session:{}", digest)).ignore();
        if let Some(session) = session {
            pipe.srem(user_key(&session.email), &digest).ignore();
        }
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to revoke session in Redis: {}", e)))?;
        Ok(())
    }

    async fn revoke_all_for_user(&self, email: &str) -> AppResult<usize> {
        let mut conn = self.connection().await?;
        let index = user_key(email);
        let digests: Vec<String> = conn
            .smembers(&index)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to list sessions in Redis: {}", e)))?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for digest in &digests {
            pipe.del(format!("session:{}", digest)).ignore();
        }
        pipe.del(&index).ignore();
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to revoke sessions in Redis: {}", e)))?;

        Ok(digests.len())
    }

    async fn close(&self) -> AppResult<()> {
        // Multiplexed connections are per call; nothing is held open
        tracing::debug!("Redis session store closed");
        Ok(())
    }
}

#[derive(Default)]
struct MemoryState {
    sessions: HashMap<String, Session>,
    by_user: HashMap<String, HashSet<String>>,
}

impl MemoryState {
    /// Drop expired sessions and the index entries pointing at them
    fn prune(&mut self, now: DateTime<Utc>) {
        self.sessions.retain(|_, s| s.expires_at > now);
        let live = &self.sessions;
        self.by_user.retain(|_, digests| {
            digests.retain(|d| live.contains_key(d));
            !digests.is_empty()
        });
    }
}

/// Process-local sessions for development and tests
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: Uuid, email: &str, role: Role, ttl: Duration) -> AppResult<Session> {
        let session = new_session(user_id, email, role, ttl)?;
        let digest = session_digest(&session.id);
        let mut state = self.state.write().await;
        state.prune(Utc::now());
        state
            .by_user
            .entry(session.email.clone())
            .or_default()
            .insert(digest.clone());
        state.sessions.insert(digest, session.clone());
        Ok(session)
    }

    async fn get(&self, session_id: &str) -> AppResult<Option<Session>> {
        let digest = session_digest(session_id);
        let state = self.state.read().await;
        Ok(state
            .sessions
            .get(&digest)
            .filter(|s| s.expires_at > Utc::now())
            .cloned())
    }

    async fn revoke(&self, session_id: &str) -> AppResult<()> {
        let digest = session_digest(session_id);
        let mut state = self.state.write().await;
        if let Some(session) = state.sessions.remove(&digest) {
            if let Some(set) = state.by_user.get_mut(&session.email) {
                set.remove(&digest);
            }
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, email: &str) -> AppResult<usize> {
        let mut state = self.state.write().await;
        let digests = state
            .by_user
            .remove(&email.trim().to_lowercase())
            .unwrap_or_default();
        let mut removed = 0;
        for digest in digests {
            if state.sessions.remove(&digest).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn close(&self) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.sessions.clear();
        state.by_user.clear();
        Ok(())
    }
}

/// Build the application-wide session store from configuration
pub async fn init_session_store(config: &AppConfig) -> AppResult<Arc<dyn SessionStore>> {
    match config.sessions.backend.trim().to_lowercase().as_str() {
        "redis" => {
            let store = RedisSessionStore::connect(&config.redis.url).await?;
            tracing::info!("Session store: redis");
            Ok(Arc::new(store))
        }
        "memory" => {
            tracing::warn!("Session store: in-memory (sessions are lost on restart)");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        other => Err(AppError::Internal(format!(
            "Unknown session backend: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemorySessionStore::new();
        let user = Uuid::new_v4();
        let session = store.create(user, "Tech@CUT.ac.zw", Role::Technician, HOUR).await.unwrap();
        assert_eq!(session.email, "tech@cut.ac.zw");

        let found = store.get(&session.id).await.unwrap().unwrap();
        assert_eq!(found.user_id, user);
        assert_eq!(found.role, Role::Technician);
        assert!(store.get("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_single_session() {
        let store = MemorySessionStore::new();
        let a = store.create(Uuid::new_v4(), "a@cut.ac.zw", Role::Staff, HOUR).await.unwrap();
        let b = store.create(Uuid::new_v4(), "a@cut.ac.zw", Role::Staff, HOUR).await.unwrap();
        store.revoke(&a.id).await.unwrap();
        assert!(store.get(&a.id).await.unwrap().is_none());
        assert!(store.get(&b.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke_all_for_user_is_case_insensitive() {
        let store = MemorySessionStore::new();
        let id = Uuid::new_v4();
        let s1 = store.create(id, "x@gmail.com", Role::Staff, HOUR).await.unwrap();
        let s2 = store.create(id, "x@gmail.com", Role::Staff, HOUR).await.unwrap();
        let other = store.create(Uuid::new_v4(), "y@cut.ac.zw", Role::Staff, HOUR).await.unwrap();

        assert_eq!(store.revoke_all_for_user("X@Gmail.com").await.unwrap(), 2);
        assert!(store.get(&s1.id).await.unwrap().is_none());
        assert!(store.get(&s2.id).await.unwrap().is_none());
        assert!(store.get(&other.id).await.unwrap().is_some());
        assert_eq!(store.revoke_all_for_user("x@gmail.com").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_session_is_not_returned() {
        let store = MemorySessionStore::new();
        let s = store
            .create(Uuid::new_v4(), "a@cut.ac.zw", Role::Staff, Duration::from_secs(0))
            .await
            .unwrap();
        assert!(store.get(&s.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_pruned_on_create() {
        let store = MemorySessionStore::new();
        for _ in 0..3 {
            store
                .create(Uuid::new_v4(), "old@cut.ac.zw", Role::Staff, Duration::from_secs(0))
                .await
                .unwrap();
        }
        let live = store.create(Uuid::new_v4(), "new@cut.ac.zw", Role::Staff, HOUR).await.unwrap();

        let state = store.state.read().await;
        assert_eq!(state.sessions.len(), 1);
        assert!(!state.by_user.contains_key("old@cut.ac.zw"));
        assert!(state.sessions.contains_key(&session_digest(&live.id)));
    }

    #[test]
    fn test_session_ids_are_unique_and_hashed() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        let digest = session_digest(&a);
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, a);
    }

    #[tokio::test]
    async fn test_retry_once_on_transient_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_once(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err("connection refused".to_string())
                    } else {
                        Ok(n)
                    }
                }
            },
            |_| true,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_second_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_once(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("timeout".to_string()) }
            },
            |_| true,
            Duration::from_millis(1),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_transient_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_once(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("auth failed".to_string()) }
            },
            |e: &String| e.contains("refused"),
            Duration::from_millis(1),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_backend_is_rejected() {
        let mut config = AppConfig::default();
        config.sessions.backend = "memcached".to_string();
        assert!(init_session_store(&config).await.is_err());
    }
}
