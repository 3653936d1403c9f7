use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header::LOCATION},
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use oauth2_github::{FlowOutcome, GitHubAuth, SessionStore};

use super::error::IntoResponseError;
use super::session::{SessionManager, VisitorSession, session_layer};

/// Runs the GitHub sign-in flow in front of the wrapped routes.
///
/// Requests to the sign-in and callback paths are answered here with a
/// `302 Found` or an error status. Every other request continues to the
/// inner service with the [`GitHubAuth`] handle available to the
/// [`crate::GitHubSession`] extractor.
///
/// Requires [`session_layer`] to run first.
pub async fn github_auth(
    State(auth): State<Arc<GitHubAuth>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(VisitorSession(mut session)) = req.extensions().get::<VisitorSession>().cloned()
    else {
        tracing::error!("github_auth needs session_layer to run first");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Session layer missing").into_response();
    };

    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let outcome = auth
        .handle(&path, query.as_deref(), &mut session)
        .await
        .into_response_error();

    match outcome {
        Ok(FlowOutcome::Redirect(location)) => found(&location),
        Ok(FlowOutcome::PassThrough) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err((status, message)) => {
            tracing::debug!(%status, "GitHub flow rejected request: {}", message);
            (status, message).into_response()
        }
    }
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Wraps `router` with the session layer and the GitHub middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{Router, routing::get};
/// use oauth2_github_axum::{GitHubAuth, InMemorySessionStore, with_github_auth};
///
/// # fn build() -> Result<Router, oauth2_github_axum::GitHubAuthError> {
/// let auth = GitHubAuth::from_env()?;
/// let app = with_github_auth(
///     Router::new().route("/", get(|| async { "hello" })),
///     auth,
///     Arc::new(InMemorySessionStore::new()),
/// );
/// # Ok(app)
/// # }
/// ```
pub fn with_github_auth(router: Router, auth: GitHubAuth, store: Arc<dyn SessionStore>) -> Router {
    router
        .layer(from_fn_with_state(Arc::new(auth), github_auth))
        .layer(from_fn_with_state(SessionManager::new(store), session_layer))
}
