use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::SessionError;
use crate::utils::gen_random_string;

/// Bytes of randomness in a session identifier.
const SESSION_ID_BYTES: usize = 32;

/// Fresh, unguessable session identifier.
pub fn new_session_id() -> Result<String, SessionError> {
    gen_random_string(SESSION_ID_BYTES).map_err(|e| SessionError::Storage(e.to_string()))
}

/// Per-visitor session consumed by the flow.
///
/// Implementations decide how the visitor is identified and where values
/// live; the flow only needs get/set/remove on named fields.
#[async_trait]
pub trait FlowSession: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, SessionError>;

    async fn set(&mut self, key: &str, value: Value) -> Result<(), SessionError>;

    async fn remove(&mut self, key: &str) -> Result<(), SessionError>;
}

/// Session backend shared by all visitors, keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<Value>, SessionError>;

    async fn set(&self, session_id: &str, key: &str, value: Value) -> Result<(), SessionError>;

    async fn delete(&self, session_id: &str, key: &str) -> Result<(), SessionError>;
}

/// A single visitor's view onto a shared [`SessionStore`].
#[derive(Clone)]
pub struct StoreSession {
    store: Arc<dyn SessionStore>,
    session_id: String,
}

impl StoreSession {
    pub fn new(store: Arc<dyn SessionStore>, session_id: impl Into<String>) -> Self {
        Self {
            store,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl std::fmt::Debug for StoreSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSession").finish_non_exhaustive()
    }
}

#[async_trait]
impl FlowSession for StoreSession {
    async fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        self.store.get(&self.session_id, key).await
    }

    async fn set(&mut self, key: &str, value: Value) -> Result<(), SessionError> {
        self.store.set(&self.session_id, key, value).await
    }

    async fn remove(&mut self, key: &str) -> Result<(), SessionError> {
        self.store.delete(&self.session_id, key).await
    }
}

#[async_trait]
impl FlowSession for HashMap<String, Value> {
    async fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(HashMap::get(self, key).cloned())
    }

    async fn set(&mut self, key: &str, value: Value) -> Result<(), SessionError> {
        self.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<(), SessionError> {
        HashMap::remove(self, key);
        Ok(())
    }
}
