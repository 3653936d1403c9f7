use serde_json::Value;

use crate::config::GitHubAuthConfig;
use crate::errors::SessionError;

use super::types::FlowSession;

/// Session field holding the anti-forgery token for one authorization attempt.
pub const STATE_SESSION_KEY: &str = "_state";

/// Session field holding the preserved post-login destination.
pub const REDIRECT_SESSION_KEY: &str = "_redirect";

/// Typed view of the session fields the flow reads and writes.
///
/// Key names come from the configuration, so callers never spell a
/// session key by hand.
pub struct AuthSession<'a, S: FlowSession + ?Sized> {
    session: &'a mut S,
    config: &'a GitHubAuthConfig,
}

impl<'a, S: FlowSession + ?Sized> AuthSession<'a, S> {
    pub fn new(session: &'a mut S, config: &'a GitHubAuthConfig) -> Self {
        Self { session, config }
    }

    /// Access token of an authenticated visitor. Empty values count as absent.
    pub async fn access_token(&self) -> Result<Option<String>, SessionError> {
        read_access_token(&*self.session, self.config).await
    }

    pub async fn is_authenticated(&self) -> Result<bool, SessionError> {
        Ok(self.access_token().await?.is_some())
    }

    pub async fn set_access_token(&mut self, token: &str) -> Result<(), SessionError> {
        self.session
            .set(
                &self.config.token_session_key,
                Value::String(token.to_string()),
            )
            .await
    }

    /// Stored profile, or `None` when no profile key is configured.
    pub async fn profile(&self) -> Result<Option<Value>, SessionError> {
        read_profile(&*self.session, self.config).await
    }

    /// Writes the profile. A no-op when no profile key is configured.
    pub async fn set_profile(&mut self, profile: Value) -> Result<(), SessionError> {
        match self.config.user_session_key.as_deref() {
            Some(key) => self.session.set(key, profile).await,
            None => Ok(()),
        }
    }

    pub async fn set_state(&mut self, state: &str) -> Result<(), SessionError> {
        self.session
            .set(STATE_SESSION_KEY, Value::String(state.to_string()))
            .await
    }

    /// Reads and deletes the stored state.
    pub async fn take_state(&mut self) -> Result<Option<String>, SessionError> {
        self.take_string(STATE_SESSION_KEY).await
    }

    pub async fn set_redirect(&mut self, destination: &str) -> Result<(), SessionError> {
        self.session
            .set(REDIRECT_SESSION_KEY, Value::String(destination.to_string()))
            .await
    }

    pub async fn clear_redirect(&mut self) -> Result<(), SessionError> {
        self.session.remove(REDIRECT_SESSION_KEY).await
    }

    /// Reads and deletes the preserved destination.
    pub async fn take_redirect(&mut self) -> Result<Option<String>, SessionError> {
        self.take_string(REDIRECT_SESSION_KEY).await
    }

    async fn take_string(&mut self, key: &str) -> Result<Option<String>, SessionError> {
        let value = self.session.get(key).await?;
        self.session.remove(key).await?;
        Ok(value.and_then(non_empty_string))
    }
}

pub(crate) async fn read_access_token<S: FlowSession + ?Sized>(
    session: &S,
    config: &GitHubAuthConfig,
) -> Result<Option<String>, SessionError> {
    Ok(session
        .get(&config.token_session_key)
        .await?
        .and_then(non_empty_string))
}

pub(crate) async fn read_profile<S: FlowSession + ?Sized>(
    session: &S,
    config: &GitHubAuthConfig,
) -> Result<Option<Value>, SessionError> {
    match config.user_session_key.as_deref() {
        Some(key) => session.get(key).await,
        None => Ok(None),
    }
}

fn non_empty_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}
