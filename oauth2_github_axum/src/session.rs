use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, StatusCode, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Cookie, HeaderMapExt};
use serde_json::Value;
use std::sync::Arc;

use oauth2_github::{GitHubAuth, SessionError, SessionStore, StoreSession, new_session_id};

use super::config::{SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME};

/// Upper bound on accepted session ids; anything longer is replaced.
const MAX_SESSION_ID_LEN: usize = 128;

/// Shared handle on the session backend used by [`session_layer`].
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

/// The current visitor's session, placed in request extensions by
/// [`session_layer`]. Usable as an extractor.
#[derive(Clone, Debug)]
pub struct VisitorSession(pub StoreSession);

impl<S> FromRequestParts<S> for VisitorSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<VisitorSession>().cloned().ok_or_else(|| {
            tracing::error!("VisitorSession missing, is session_layer installed?");
            (StatusCode::INTERNAL_SERVER_ERROR, "Session layer missing")
        })
    }
}

/// Read access to the authentication result for downstream handlers.
///
/// Available on every request that passed through [`crate::github_auth`].
///
/// # Example
///
/// ```no_run
/// use oauth2_github_axum::GitHubSession;
///
/// async fn whoami(github: GitHubSession) -> String {
///     match github.profile().await.ok().flatten() {
///         Some(profile) => profile["login"].to_string(),
///         None => "anonymous".to_string(),
///     }
/// }
/// ```
#[derive(Clone)]
pub struct GitHubSession {
    auth: Arc<GitHubAuth>,
    session: StoreSession,
}

impl GitHubSession {
    pub async fn access_token(&self) -> Result<Option<String>, SessionError> {
        self.auth.access_token(&self.session).await
    }

    pub async fn profile(&self) -> Result<Option<Value>, SessionError> {
        self.auth.profile(&self.session).await
    }

    pub async fn is_authenticated(&self) -> Result<bool, SessionError> {
        Ok(self.access_token().await?.is_some())
    }
}

impl<S> FromRequestParts<S> for GitHubSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let VisitorSession(session) = VisitorSession::from_request_parts(parts, state).await?;
        let auth = parts.extensions.get::<Arc<GitHubAuth>>().cloned().ok_or_else(|| {
            tracing::error!("GitHubAuth missing, is github_auth installed?");
            (StatusCode::INTERNAL_SERVER_ERROR, "GitHub auth middleware missing")
        })?;
        Ok(Self { auth, session })
    }
}

/// Loads or creates the visitor's session from the session cookie.
///
/// A new id is issued (with `Set-Cookie`) when the request carries no usable
/// session cookie.
pub async fn session_layer(
    State(manager): State<SessionManager>,
    mut req: Request,
    next: Next,
) -> Response {
    let existing = req
        .headers()
        .typed_get::<Cookie>()
        .and_then(|cookies| cookies.get(SESSION_COOKIE_NAME.as_str()).map(str::to_string))
        .filter(|id| is_valid_session_id(id));

    let (session_id, is_new) = match existing {
        Some(id) => (id, false),
        None => match new_session_id() {
            Ok(id) => {
                tracing::debug!("Issuing new session id");
                (id, true)
            }
            Err(e) => {
                tracing::error!("Failed to create session id: {}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
            }
        },
    };

    req.extensions_mut().insert(VisitorSession(StoreSession::new(
        manager.store.clone(),
        session_id.clone(),
    )));

    let mut response = next.run(req).await;

    if is_new {
        let cookie = session_cookie(&session_id);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(_) => tracing::error!("Failed to create session cookie header"),
        }
    }
    response
}

fn session_cookie(session_id: &str) -> String {
    format!(
        "{}={}; SameSite=Lax; Secure; HttpOnly; Path=/; Max-Age={}",
        SESSION_COOKIE_NAME.as_str(),
        session_id,
        *SESSION_COOKIE_MAX_AGE
    )
}

fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
