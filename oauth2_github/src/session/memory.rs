use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::errors::SessionError;

use super::types::SessionStore;

/// Lifetime of an idle session, matching the default session cookie Max-Age.
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(600);

struct SessionEntry {
    fields: HashMap<String, Value>,
    expires_at: Instant,
}

impl SessionEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-local session store.
///
/// Each session expires `ttl` after its last write. Expired sessions read as
/// empty and are pruned on the next write. Suitable for tests and
/// single-instance deployments.
pub struct InMemorySessionStore {
    entry: Mutex<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self {
            entry: Mutex::new(HashMap::new()),
            ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory session store");
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        tracing::info!("Creating new in-memory session store, ttl={:?}", ttl);
        Self {
            ttl,
            ..Self::default()
        }
    }

    /// Number of live sessions holding at least one field.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entry
            .lock()
            .await
            .values()
            .filter(|session| !session.is_expired(now) && !session.fields.is_empty())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<Value>, SessionError> {
        let now = Instant::now();
        Ok(self
            .entry
            .lock()
            .await
            .get(session_id)
            .filter(|session| !session.is_expired(now))
            .and_then(|session| session.fields.get(key))
            .cloned())
    }

    async fn set(&self, session_id: &str, key: &str, value: Value) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut entry = self.entry.lock().await;

        let before = entry.len();
        entry.retain(|_, session| !session.is_expired(now));
        if entry.len() < before {
            tracing::debug!("Pruned {} expired sessions", before - entry.len());
        }

        let session = entry
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                fields: HashMap::new(),
                expires_at: now,
            });
        session.fields.insert(key.to_string(), value);
        session.expires_at = now + self.ttl;
        Ok(())
    }

    async fn delete(&self, session_id: &str, key: &str) -> Result<(), SessionError> {
        let mut entry = self.entry.lock().await;
        if let Some(session) = entry.get_mut(session_id) {
            session.fields.remove(key);
            if session.fields.is_empty() {
                entry.remove(session_id);
            }
        }
        Ok(())
    }
}
